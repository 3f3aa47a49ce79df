//! Wards, admissions and discharges.

use log::info;
use serde::{Deserialize, Serialize};

use super::{require_patient, ServiceError, ServiceResult};
use crate::db::{Database, DbError};
use crate::models::{now_timestamp, Admission, AdmissionStatus, Session, Ward};
use crate::validation::{rules, ValidationErrors};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WardInput {
    pub name: String,
    pub ward_type: String,
    pub total_beds: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionInput {
    pub patient_id: String,
    pub ward_id: Option<String>,
    pub consultation_id: Option<String>,
    pub bed_number: String,
    pub admission_reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DischargeOutcome {
    /// Discharged, deceased or referred
    pub status: AdmissionStatus,
    pub reason: String,
}

pub struct WardService<'a> {
    db: &'a Database,
}

impl<'a> WardService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create a ward with every bed free.
    pub fn create_ward(&self, input: &WardInput) -> ServiceResult<Ward> {
        let mut errors = ValidationErrors::new();
        let name = rules::required_text(&mut errors, "name", &input.name, 2);
        if input.total_beds == 0 {
            errors.push("total_beds", "must be positive");
        }
        let Some(name) = name else {
            return Err(errors.into());
        };
        errors.finish(())?;

        let stamp = now_timestamp();
        let ward = Ward {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            ward_type: rules::optional_text(&input.ward_type),
            total_beds: input.total_beds,
            available_beds: input.total_beds,
            created_at: stamp.clone(),
            updated_at: stamp,
        };
        self.db.insert_ward(&ward)?;
        info!("Created ward {} with {} beds", ward.name, ward.total_beds);
        Ok(ward)
    }

    pub fn get_ward(&self, id: &str) -> ServiceResult<Ward> {
        self.db
            .get_ward(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("Ward {}", id)))
    }

    pub fn list_wards(&self) -> ServiceResult<Vec<Ward>> {
        Ok(self.db.list_wards()?)
    }

    /// Admit a patient, taking a bed when a ward is given.
    pub fn admit_patient(&self, input: &AdmissionInput, session: &Session) -> ServiceResult<Admission> {
        let mut errors = ValidationErrors::new();
        let patient_id = rules::required_text(&mut errors, "patient_id", &input.patient_id, 1);
        let Some(patient_id) = patient_id else {
            return Err(errors.into());
        };

        require_patient(self.db, &patient_id)?;
        if let Some(active) = self.db.get_active_admission_for_patient(&patient_id)? {
            return Err(ServiceError::Conflict(format!(
                "Patient {} is already admitted ({})",
                patient_id, active.id
            )));
        }
        if let Some(ward_id) = &input.ward_id {
            let ward = self.get_ward(ward_id)?;
            if ward.available_beds == 0 {
                return Err(ServiceError::Conflict(format!("No free beds in {}", ward.name)));
            }
        }

        let stamp = now_timestamp();
        let admission = Admission {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            ward_id: input.ward_id.clone(),
            consultation_id: input.consultation_id.clone(),
            bed_number: rules::optional_text(&input.bed_number),
            admission_date: stamp.clone(),
            admission_reason: rules::optional_text(&input.admission_reason),
            admitted_by: Some(session.user_id.clone()),
            discharge_date: None,
            discharge_reason: None,
            discharged_by: None,
            status: AdmissionStatus::Admitted,
            created_at: stamp.clone(),
            updated_at: stamp,
        };

        match self.db.admit(&admission) {
            Ok(()) => {}
            Err(DbError::Constraint(reason)) => return Err(ServiceError::Conflict(reason)),
            Err(e) => return Err(e.into()),
        }
        info!(
            "Admitted patient {} ({}) by {}",
            admission.patient_id, admission.id, session.user_id
        );
        Ok(admission)
    }

    /// Close an open admission and free its bed.
    pub fn discharge_patient(
        &self,
        admission_id: &str,
        outcome: &DischargeOutcome,
        session: &Session,
    ) -> ServiceResult<Admission> {
        let mut admission = self.get_admission(admission_id)?;
        if !admission.status.is_active() || outcome.status.is_active() {
            return Err(ServiceError::InvalidTransition {
                from: admission.status.to_string(),
                to: outcome.status.to_string(),
            });
        }

        let stamp = now_timestamp();
        admission.status = outcome.status;
        admission.discharge_date = Some(stamp.clone());
        admission.discharge_reason = rules::optional_text(&outcome.reason);
        admission.discharged_by = Some(session.user_id.clone());
        admission.updated_at = stamp;

        if !self.db.discharge(&admission)? {
            // Someone else closed it between the read and the write.
            return Err(ServiceError::InvalidTransition {
                from: AdmissionStatus::Discharged.to_string(),
                to: outcome.status.to_string(),
            });
        }
        info!(
            "Admission {} closed as {} by {}",
            admission.id, admission.status, session.user_id
        );
        Ok(admission)
    }

    pub fn get_admission(&self, id: &str) -> ServiceResult<Admission> {
        self.db
            .get_admission(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("Admission {}", id)))
    }

    pub fn list_active_admissions(&self) -> ServiceResult<Vec<Admission>> {
        Ok(self.db.list_active_admissions()?)
    }
}
