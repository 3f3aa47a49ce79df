//! Hospital Records Core Library
//!
//! Data-access and validation layer for a hospital records front end:
//! patient registration, appointments, consultations and lab work, billing,
//! pharmacy stock, ward admissions and specialty clinic records.
//!
//! # Architecture
//!
//! ```text
//!   Front end form ──► validation ──► service ──► db::Database (SQLite)
//!                          │              │
//!                    FieldError list   Session (explicit actor)
//! ```
//!
//! Every create operation validates before touching the database and then
//! issues a single write (or a single transaction for multi-row records).
//! Nothing is retried.
//!
//! # Modules
//!
//! - [`db`]: SQLite schema and per-table operations
//! - [`models`]: Domain types (Patient, Appointment, Bill, Admission, etc.)
//! - [`validation`]: Form rules that report every offending field
//! - [`service`]: Operations, sessions and the [`ServiceError`] type
//! - [`identifiers`]: `PAT-2024-0042` style numbers
//! - [`config`]: TOML runtime configuration

pub mod config;
pub mod db;
pub mod identifiers;
pub mod models;
pub mod service;
pub mod validation;

// Re-export commonly used types
pub use config::ServiceConfig;
pub use db::Database;
pub use models::{Appointment, Patient, Session, StaffProfile, StaffRole, VisitStatus};
pub use service::{
    AppointmentService, AuthEvent, PatientService, ServiceError, ServiceResult, SessionManager,
};
pub use validation::{AppointmentForm, FieldError, PatientForm, ValidationErrors};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum HospitalRecordsError {
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<ServiceError> for HospitalRecordsError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(errors) => HospitalRecordsError::ValidationError(errors.to_string()),
            ServiceError::Database(db) => HospitalRecordsError::DatabaseError(db.to_string()),
            ServiceError::NotFound(what) => HospitalRecordsError::NotFound(what),
            transition @ ServiceError::InvalidTransition { .. } => {
                HospitalRecordsError::InvalidTransition(transition.user_message())
            }
            ServiceError::Conflict(reason) => HospitalRecordsError::Conflict(reason),
            ServiceError::Unauthorized(reason) => HospitalRecordsError::Unauthorized(reason),
        }
    }
}

impl From<db::DbError> for HospitalRecordsError {
    fn from(e: db::DbError) -> Self {
        HospitalRecordsError::DatabaseError(e.to_string())
    }
}

impl From<config::ConfigError> for HospitalRecordsError {
    fn from(e: config::ConfigError) -> Self {
        HospitalRecordsError::InvalidInput(e.to_string())
    }
}

impl From<models::ParseEnumError> for HospitalRecordsError {
    fn from(e: models::ParseEnumError) -> Self {
        HospitalRecordsError::InvalidInput(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for HospitalRecordsError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        HospitalRecordsError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

fn new_core(db: Database, config: ServiceConfig) -> Arc<HospitalRecordsCore> {
    Arc::new(HospitalRecordsCore {
        db: Arc::new(Mutex::new(db)),
        config,
    })
}

/// Open or create a database at the given path with default settings.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<HospitalRecordsCore>, HospitalRecordsError> {
    let db = Database::open(&path)?;
    Ok(new_core(db, ServiceConfig::default()))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<HospitalRecordsCore>, HospitalRecordsError> {
    let db = Database::open_in_memory()?;
    Ok(new_core(db, ServiceConfig::default()))
}

/// Load a TOML config file and open the database it names.
#[uniffi::export]
pub fn open_with_config(config_path: String) -> Result<Arc<HospitalRecordsCore>, HospitalRecordsError> {
    let config = ServiceConfig::load(&config_path)?;
    let db = match &config.database_path {
        Some(path) => Database::open(path)?,
        None => Database::open_in_memory()?,
    };
    Ok(new_core(db, config))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe service wrapper for FFI.
///
/// Every patient and appointment call, read or write, takes the bearer token
/// returned by [`sign_in`](Self::sign_in). Only staff registration and the
/// session calls themselves are open.
#[derive(uniffi::Object)]
pub struct HospitalRecordsCore {
    db: Arc<Mutex<Database>>,
    config: ServiceConfig,
}

#[uniffi::export]
impl HospitalRecordsCore {
    // =========================================================================
    // Staff & Sessions
    // =========================================================================

    /// Register a staff profile.
    pub fn create_staff_profile(
        &self,
        full_name: String,
        email: String,
        role: String,
    ) -> Result<FfiStaffProfile, HospitalRecordsError> {
        let role: StaffRole = role.parse()?;
        let db = self.db.lock()?;
        let profile = StaffProfile::new(full_name, email, role);
        db.insert_profile(&profile)?;
        Ok(profile.into())
    }

    pub fn sign_in(&self, email: String) -> Result<FfiSession, HospitalRecordsError> {
        let db = self.db.lock()?;
        let session = SessionManager::new(&db).sign_in(&email)?;
        Ok(session.into())
    }

    pub fn current_session(&self, token: String) -> Result<Option<FfiSession>, HospitalRecordsError> {
        let db = self.db.lock()?;
        let session = SessionManager::new(&db).current_session(&token)?;
        Ok(session.map(|s| s.into()))
    }

    pub fn sign_out(&self, token: String) -> Result<(), HospitalRecordsError> {
        let db = self.db.lock()?;
        let manager = SessionManager::new(&db);
        if let Some(session) = manager.current_session(&token)? {
            manager.sign_out(&session)?;
        }
        Ok(())
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// All patients, newest registration first.
    pub fn list_patients(&self, token: String) -> Result<Vec<FfiPatient>, HospitalRecordsError> {
        let db = self.db.lock()?;
        let session = SessionManager::new(&db).require_session(&token)?;
        let patients = PatientService::new(&db, &self.config).list_patients(&session)?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    pub fn get_patient(&self, id: String, token: String) -> Result<FfiPatient, HospitalRecordsError> {
        let db = self.db.lock()?;
        SessionManager::new(&db).require_session(&token)?;
        let patient = PatientService::new(&db, &self.config).get_patient(&id)?;
        Ok(patient.into())
    }

    pub fn search_patients(
        &self,
        query: String,
        limit: u32,
        token: String,
    ) -> Result<Vec<FfiPatient>, HospitalRecordsError> {
        let db = self.db.lock()?;
        SessionManager::new(&db).require_session(&token)?;
        let patients = PatientService::new(&db, &self.config).search_patients(&query, limit as usize)?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    /// Validate and register a patient.
    pub fn create_patient(&self, form: FfiPatientForm, token: String) -> Result<FfiPatient, HospitalRecordsError> {
        let db = self.db.lock()?;
        let session = SessionManager::new(&db).require_session(&token)?;
        let patient = PatientService::new(&db, &self.config).create_patient(&form.into(), &session)?;
        Ok(patient.into())
    }

    pub fn update_patient(
        &self,
        id: String,
        form: FfiPatientForm,
        token: String,
    ) -> Result<FfiPatient, HospitalRecordsError> {
        let db = self.db.lock()?;
        let session = SessionManager::new(&db).require_session(&token)?;
        let patient = PatientService::new(&db, &self.config).update_patient(&id, &form.into(), &session)?;
        Ok(patient.into())
    }

    // =========================================================================
    // Appointment Operations
    // =========================================================================

    pub fn schedule_appointment(
        &self,
        form: FfiAppointmentForm,
        token: String,
    ) -> Result<FfiAppointment, HospitalRecordsError> {
        let db = self.db.lock()?;
        let session = SessionManager::new(&db).require_session(&token)?;
        let appointment = AppointmentService::new(&db).schedule_appointment(&form.into(), &session)?;
        Ok(appointment.into())
    }

    /// `status` is one of `pending`, `in_progress`, `completed`, `cancelled`.
    pub fn update_appointment_status(
        &self,
        id: String,
        status: String,
        token: String,
    ) -> Result<FfiAppointment, HospitalRecordsError> {
        let status: VisitStatus = status.parse()?;
        let db = self.db.lock()?;
        SessionManager::new(&db).require_session(&token)?;
        let appointment = AppointmentService::new(&db).update_appointment_status(&id, status)?;
        Ok(appointment.into())
    }

    pub fn list_appointments(&self, token: String) -> Result<Vec<FfiAppointment>, HospitalRecordsError> {
        let db = self.db.lock()?;
        SessionManager::new(&db).require_session(&token)?;
        let appointments = AppointmentService::new(&db).list_appointments()?;
        Ok(appointments.into_iter().map(|a| a.into()).collect())
    }

    pub fn list_appointments_for_patient(
        &self,
        patient_id: String,
        token: String,
    ) -> Result<Vec<FfiAppointment>, HospitalRecordsError> {
        let db = self.db.lock()?;
        SessionManager::new(&db).require_session(&token)?;
        let appointments = AppointmentService::new(&db).list_appointments_for_patient(&patient_id)?;
        Ok(appointments.into_iter().map(|a| a.into()).collect())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe staff profile.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStaffProfile {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub role: String,
}

impl From<StaffProfile> for FfiStaffProfile {
    fn from(profile: StaffProfile) -> Self {
        Self {
            id: profile.id,
            full_name: profile.full_name,
            email: profile.email,
            role: profile.role.to_string(),
        }
    }
}

/// FFI-safe session. The token is only ever returned here; the database keeps its digest.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSession {
    pub user_id: String,
    pub email: String,
    pub role: String,
    pub token: String,
}

impl From<Session> for FfiSession {
    fn from(session: Session) -> Self {
        Self {
            user_id: session.user_id,
            email: session.email,
            role: session.role.to_string(),
            token: session.token,
        }
    }
}

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: String,
    pub patient_number: String,
    pub full_name: String,
    pub date_of_birth: Option<String>,
    pub age: Option<u32>,
    pub sex: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub blood_group: Option<String>,
    pub allergies: Vec<String>,
    pub insurance_company: Option<String>,
    pub insurance_number: Option<String>,
    pub insurance_status: String,
    pub patient_type: String,
    pub registered_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            patient_number: patient.patient_number,
            full_name: patient.full_name,
            date_of_birth: patient.date_of_birth,
            age: patient.age,
            sex: patient.sex.map(|s| s.to_string()),
            phone: patient.phone,
            email: patient.email,
            address: patient.address,
            city: patient.city,
            blood_group: patient.blood_group.map(|b| b.to_string()),
            allergies: patient.allergies,
            insurance_company: patient.insurance_company,
            insurance_number: patient.insurance_number,
            insurance_status: patient.insurance_status.to_string(),
            patient_type: patient.patient_type.to_string(),
            registered_by: patient.registered_by,
            created_at: patient.created_at,
            updated_at: patient.updated_at,
        }
    }
}

/// FFI-safe registration form; fields are raw user input.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiPatientForm {
    pub full_name: String,
    pub date_of_birth: String,
    pub age: String,
    pub sex: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub blood_group: String,
    pub allergies: String,
    pub insurance_company: String,
    pub insurance_number: String,
    pub insurance_status: String,
    pub patient_type: String,
}

impl From<FfiPatientForm> for PatientForm {
    fn from(form: FfiPatientForm) -> Self {
        PatientForm {
            full_name: form.full_name,
            date_of_birth: form.date_of_birth,
            age: form.age,
            sex: form.sex,
            phone: form.phone,
            email: form.email,
            address: form.address,
            city: form.city,
            blood_group: form.blood_group,
            allergies: form.allergies,
            insurance_company: form.insurance_company,
            insurance_number: form.insurance_number,
            insurance_status: form.insurance_status,
            patient_type: form.patient_type,
        }
    }
}

/// FFI-safe scheduling form.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiAppointmentForm {
    pub patient_id: String,
    pub doctor_id: String,
    pub appointment_date: String,
    pub appointment_time: String,
    pub reason: String,
    pub notes: String,
}

impl From<FfiAppointmentForm> for AppointmentForm {
    fn from(form: FfiAppointmentForm) -> Self {
        AppointmentForm {
            patient_id: form.patient_id,
            doctor_id: form.doctor_id,
            appointment_date: form.appointment_date,
            appointment_time: form.appointment_time,
            reason: form.reason,
            notes: form.notes,
        }
    }
}

/// FFI-safe appointment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointment {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: Option<String>,
    pub appointment_date: String,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub created_by: Option<String>,
    pub created_at: String,
}

impl From<Appointment> for FfiAppointment {
    fn from(appointment: Appointment) -> Self {
        Self {
            id: appointment.id,
            patient_id: appointment.patient_id,
            doctor_id: appointment.doctor_id,
            appointment_date: appointment.appointment_date,
            reason: appointment.reason,
            notes: appointment.notes,
            status: appointment.status.to_string(),
            created_by: appointment.created_by,
            created_at: appointment.created_at,
        }
    }
}
