//! Sign-in, sign-out and session lookup.

use log::info;
use sha2::{Digest, Sha256};

use super::{ServiceError, ServiceResult};
use crate::db::Database;
use crate::models::{now_timestamp, Session};

/// Notification sent to auth listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    SignedIn { user_id: String },
    SignedOut { user_id: String },
}

type AuthListener<'a> = Box<dyn Fn(&AuthEvent) + Send + 'a>;

/// Opens and closes sessions against the `profiles`/`sessions` tables.
pub struct SessionManager<'a> {
    db: &'a Database,
    listeners: Vec<AuthListener<'a>>,
}

/// SHA-256 hex digest of a bearer token; the only form persisted.
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn new_token() -> String {
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}

impl<'a> SessionManager<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            listeners: Vec::new(),
        }
    }

    /// Register a callback invoked after every sign-in and sign-out.
    pub fn on_auth_state_change<F>(&mut self, listener: F)
    where
        F: Fn(&AuthEvent) + Send + 'a,
    {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&self, event: AuthEvent) {
        for listener in &self.listeners {
            listener(&event);
        }
    }

    /// Open a session for the staff member with this email.
    pub fn sign_in(&self, email: &str) -> ServiceResult<Session> {
        let profile = self
            .db
            .get_profile_by_email(email.trim())?
            .ok_or_else(|| ServiceError::Unauthorized(format!("no staff account for {}", email)))?;

        let token = new_token();
        let created_at = now_timestamp();
        self.db
            .insert_session(&token_digest(&token), &profile.id, &created_at)?;

        info!("Staff {} signed in as {}", profile.id, profile.role);
        self.notify(AuthEvent::SignedIn {
            user_id: profile.id.clone(),
        });

        Ok(Session {
            user_id: profile.id,
            email: profile.email,
            role: profile.role,
            token,
            created_at,
        })
    }

    /// Resolve a bearer token to its live session.
    pub fn current_session(&self, token: &str) -> ServiceResult<Option<Session>> {
        let session = self
            .db
            .get_session_profile(&token_digest(token))?
            .map(|(profile, created_at)| Session {
                user_id: profile.id,
                email: profile.email,
                role: profile.role,
                token: token.to_string(),
                created_at,
            });
        Ok(session)
    }

    /// Like [`current_session`](Self::current_session) but an unknown token is an error.
    pub fn require_session(&self, token: &str) -> ServiceResult<Session> {
        self.current_session(token)?
            .ok_or_else(|| ServiceError::Unauthorized("session expired or signed out".into()))
    }

    /// Revoke a session. Signing out twice is harmless.
    pub fn sign_out(&self, session: &Session) -> ServiceResult<()> {
        if self
            .db
            .revoke_session(&token_digest(&session.token), &now_timestamp())?
        {
            info!("Staff {} signed out", session.user_id);
            self.notify(AuthEvent::SignedOut {
                user_id: session.user_id.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{StaffProfile, StaffRole};
    use std::sync::{Arc, Mutex};

    fn setup() -> (Database, StaffProfile) {
        let db = Database::open_in_memory().unwrap();
        let profile = StaffProfile::new("Joy Mwangi".into(), "joy@hospital.test".into(), StaffRole::Receptionist);
        db.insert_profile(&profile).unwrap();
        (db, profile)
    }

    #[test]
    fn test_sign_in_and_resolve() {
        let (db, profile) = setup();
        let manager = SessionManager::new(&db);

        let session = manager.sign_in("joy@hospital.test").unwrap();
        assert_eq!(session.user_id, profile.id);
        assert_eq!(session.role, StaffRole::Receptionist);
        assert_eq!(session.token.len(), 64);

        let resolved = manager.current_session(&session.token).unwrap().unwrap();
        assert_eq!(resolved.user_id, profile.id);
    }

    #[test]
    fn test_token_not_stored_in_clear() {
        let (db, _) = setup();
        let session = SessionManager::new(&db).sign_in("joy@hospital.test").unwrap();

        let stored: String = db
            .conn()
            .query_row("SELECT token_hash FROM sessions", [], |row| row.get(0))
            .unwrap();
        assert_ne!(stored, session.token);
        assert_eq!(stored, token_digest(&session.token));
    }

    #[test]
    fn test_unknown_email() {
        let (db, _) = setup();
        let result = SessionManager::new(&db).sign_in("nobody@hospital.test");
        assert!(matches!(result, Err(ServiceError::Unauthorized(_))));
    }

    #[test]
    fn test_sign_out_notifies_once() {
        let (db, profile) = setup();
        let events = Arc::new(Mutex::new(Vec::new()));

        let mut manager = SessionManager::new(&db);
        let sink = Arc::clone(&events);
        manager.on_auth_state_change(move |e| sink.lock().unwrap().push(e.clone()));

        let session = manager.sign_in("joy@hospital.test").unwrap();
        manager.sign_out(&session).unwrap();
        manager.sign_out(&session).unwrap();

        assert!(manager.current_session(&session.token).unwrap().is_none());
        assert!(manager.require_session(&session.token).is_err());
        assert_eq!(
            *events.lock().unwrap(),
            vec![
                AuthEvent::SignedIn { user_id: profile.id.clone() },
                AuthEvent::SignedOut { user_id: profile.id },
            ]
        );
    }
}
