//! Database layer for hospital records.
//!
//! Stands in for the hosted backend: row-level select/insert/update per table,
//! with the schema enforcing foreign keys, enumerations and identifier uniqueness.

mod schema;
mod admissions;
mod appointments;
mod billing;
mod clinical;
pub(crate) mod patients;
mod pharmacy;
mod profiles;
mod specialty;

pub use schema::*;

use log::debug;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, ErrorCode};
use std::path::Path;
use thiserror::Error;

use crate::models::{
    AdmissionStatus, BloodGroup, InsuranceStatus, MaternityVisitType, PatientType, PaymentMethod,
    PaymentStatus, Sex, StaffRole, TestStatus, VisitStatus,
};

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

impl DbError {
    /// True when the failure is a UNIQUE/CHECK/FOREIGN KEY rejection.
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            DbError::Constraint(_) => true,
            DbError::Sqlite(rusqlite::Error::SqliteFailure(e, _)) => {
                e.code == ErrorCode::ConstraintViolation
            }
            _ => false,
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        debug!("Opening database at {:?}", path.as_ref());
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Begin a transaction for multi-row writes.
    ///
    /// Callers only hold `&Database`, so nesting is not checked; services never nest.
    pub(crate) fn write_transaction(&self) -> DbResult<rusqlite::Transaction<'_>> {
        Ok(self.conn.unchecked_transaction()?)
    }
}

/// Closed enumerations are stored as their text spelling.
macro_rules! sql_text_enum {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ToSql for $ty {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.as_str()))
                }
            }

            impl FromSql for $ty {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    value
                        .as_str()?
                        .parse()
                        .map_err(|e| FromSqlError::Other(Box::new(e)))
                }
            }
        )+
    };
}

sql_text_enum!(
    AdmissionStatus,
    BloodGroup,
    InsuranceStatus,
    MaternityVisitType,
    PatientType,
    PaymentMethod,
    PaymentStatus,
    Sex,
    StaffRole,
    TestStatus,
    VisitStatus,
);
