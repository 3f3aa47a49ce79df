//! Appointment database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{Appointment, VisitStatus};

const APPOINTMENT_COLUMNS: &str = r#"
    id, patient_id, doctor_id, appointment_date, reason, notes,
    status, created_by, created_at, updated_at
"#;

fn appointment_from_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        appointment_date: row.get(3)?,
        reason: row.get(4)?,
        notes: row.get(5)?,
        status: row.get(6)?,
        created_by: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

impl Database {
    /// Insert a new appointment.
    pub fn insert_appointment(&self, appointment: &Appointment) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO appointments (
                id, patient_id, doctor_id, appointment_date, reason, notes,
                status, created_by, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                appointment.id,
                appointment.patient_id,
                appointment.doctor_id,
                appointment.appointment_date,
                appointment.reason,
                appointment.notes,
                appointment.status,
                appointment.created_by,
                appointment.created_at,
                appointment.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Get an appointment by ID.
    pub fn get_appointment(&self, id: &str) -> DbResult<Option<Appointment>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM appointments WHERE id = ?", APPOINTMENT_COLUMNS),
                [id],
                appointment_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all appointments, earliest first.
    pub fn list_appointments(&self) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM appointments ORDER BY appointment_date ASC, rowid ASC",
            APPOINTMENT_COLUMNS
        ))?;
        let rows = stmt.query_map([], appointment_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List a patient's appointments, earliest first.
    pub fn list_appointments_for_patient(&self, patient_id: &str) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM appointments WHERE patient_id = ? ORDER BY appointment_date ASC, rowid ASC",
            APPOINTMENT_COLUMNS
        ))?;
        let rows = stmt.query_map([patient_id], appointment_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Set an appointment's status.
    pub fn update_appointment_status(
        &self,
        id: &str,
        status: VisitStatus,
        updated_at: &str,
    ) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE appointments SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, status, updated_at],
        )?;
        Ok(rows_affected > 0)
    }
}
