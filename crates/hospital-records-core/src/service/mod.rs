//! Data-access services.
//!
//! Each service borrows the [`Database`](crate::db::Database) and the
//! [`ServiceConfig`](crate::config::ServiceConfig). Operations that record an
//! actor take the caller's [`Session`](crate::models::Session) explicitly.
//! Create operations validate first, so invalid input never reaches the
//! database, and then issue a single write. Nothing is retried.

mod admissions;
mod appointments;
mod auth;
mod billing;
mod clinical;
mod patients;
mod pharmacy;
mod specialty;

pub use admissions::*;
pub use appointments::*;
pub use auth::*;
pub use billing::*;
pub use clinical::*;
pub use patients::*;
pub use pharmacy::*;
pub use specialty::*;

use thiserror::Error;

use crate::db::DbError;
use crate::identifiers::IdentifierError;
use crate::models::{Session, StaffRole};
use crate::validation::ValidationErrors;

/// Service errors.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Input rejected before any write; recoverable by correcting the fields.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// The request is well-formed but conflicts with current state.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl From<IdentifierError> for ServiceError {
    fn from(e: IdentifierError) -> Self {
        match e {
            IdentifierError::Database(db) => ServiceError::Database(db),
            exhausted @ IdentifierError::Exhausted { .. } => {
                ServiceError::Conflict(exhausted.to_string())
            }
        }
    }
}

impl ServiceError {
    /// One-line message suitable for a notification.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::Validation(errors) => {
                format!("Please correct the highlighted fields: {}", errors)
            }
            ServiceError::Database(e) if e.is_constraint_violation() => {
                "The record conflicts with existing data. Please review and resubmit.".into()
            }
            ServiceError::Database(_) => {
                "The records service is unavailable. Please try again.".into()
            }
            ServiceError::NotFound(what) => format!("{} could not be found.", what),
            ServiceError::InvalidTransition { from, to } => {
                format!("A record that is {} cannot be changed to {}.", from, to)
            }
            ServiceError::Conflict(reason) => reason.clone(),
            ServiceError::Unauthorized(reason) => format!("Not allowed: {}", reason),
        }
    }

    /// Field errors, when this is a validation failure.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            ServiceError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Reject sessions whose role is not in `allowed`.
pub(crate) fn require_role(session: &Session, allowed: &[StaffRole], action: &str) -> ServiceResult<()> {
    if allowed.contains(&session.role) {
        Ok(())
    } else {
        Err(ServiceError::Unauthorized(format!(
            "{} cannot {}",
            session.role, action
        )))
    }
}

/// Fail with `NotFound` unless the patient exists.
pub(crate) fn require_patient(db: &crate::db::Database, patient_id: &str) -> ServiceResult<()> {
    if db.patient_exists(patient_id)? {
        Ok(())
    } else {
        Err(ServiceError::NotFound(format!("Patient {}", patient_id)))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::db::Database;
    use crate::models::{Session, StaffProfile, StaffRole};

    /// Insert a profile and return a session for it.
    pub fn session_for(db: &Database, name: &str, role: StaffRole) -> Session {
        let email = format!("{}@hospital.test", name.to_lowercase().replace(' ', "."));
        let profile = StaffProfile::new(name.into(), email.clone(), role);
        db.insert_profile(&profile).unwrap();
        Session {
            user_id: profile.id,
            email,
            role,
            token: "test-token".into(),
            created_at: profile.created_at,
        }
    }
}
