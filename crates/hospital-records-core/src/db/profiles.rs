//! Staff profile and session operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{StaffProfile, StaffRole};

const PROFILE_COLUMNS: &str =
    "id, full_name, email, phone, address, role, created_at, updated_at";

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<StaffProfile> {
    Ok(StaffProfile {
        id: row.get(0)?,
        full_name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        address: row.get(4)?,
        role: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

impl Database {
    /// Insert a staff profile.
    pub fn insert_profile(&self, profile: &StaffProfile) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO profiles (id, full_name, email, phone, address, role, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                profile.id,
                profile.full_name,
                profile.email,
                profile.phone,
                profile.address,
                profile.role,
                profile.created_at,
                profile.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Get a profile by ID.
    pub fn get_profile(&self, id: &str) -> DbResult<Option<StaffProfile>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM profiles WHERE id = ?", PROFILE_COLUMNS),
                [id],
                profile_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get a profile by email (case-insensitive).
    pub fn get_profile_by_email(&self, email: &str) -> DbResult<Option<StaffProfile>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM profiles WHERE lower(email) = lower(?)",
                    PROFILE_COLUMNS
                ),
                [email],
                profile_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List profiles holding a role, by name.
    pub fn list_profiles_by_role(&self, role: StaffRole) -> DbResult<Vec<StaffProfile>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM profiles WHERE role = ? ORDER BY full_name",
            PROFILE_COLUMNS
        ))?;
        let rows = stmt.query_map([role], profile_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Record a new session by token digest.
    pub fn insert_session(&self, token_hash: &str, user_id: &str, created_at: &str) -> DbResult<()> {
        self.conn.execute(
            "INSERT INTO sessions (token_hash, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![token_hash, user_id, created_at],
        )?;
        Ok(())
    }

    /// Resolve a live session to its profile and start time.
    pub fn get_session_profile(&self, token_hash: &str) -> DbResult<Option<(StaffProfile, String)>> {
        self.conn
            .query_row(
                r#"
                SELECT p.id, p.full_name, p.email, p.phone, p.address, p.role,
                       p.created_at, p.updated_at, s.created_at
                FROM sessions s
                JOIN profiles p ON p.id = s.user_id
                WHERE s.token_hash = ? AND s.revoked_at IS NULL
                "#,
                [token_hash],
                |row| Ok((profile_from_row(row)?, row.get(8)?)),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Revoke a session. Returns false if it was unknown or already revoked.
    pub fn revoke_session(&self, token_hash: &str, revoked_at: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE sessions SET revoked_at = ?2 WHERE token_hash = ?1 AND revoked_at IS NULL",
            params![token_hash, revoked_at],
        )?;
        Ok(rows_affected > 0)
    }
}
