//! Consultations and laboratory requests.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::{require_patient, require_role, ServiceError, ServiceResult};
use crate::db::Database;
use crate::models::{
    now_timestamp, Consultation, LabRequest, Session, StaffRole, TestStatus, VisitStatus,
};
use crate::validation::{rules, ValidationErrors};

/// Opening notes for a consultation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsultationInput {
    pub patient_id: String,
    pub appointment_id: Option<String>,
    pub chief_complaint: String,
    pub signs_and_symptoms: String,
    pub initial_diagnosis: String,
}

/// Closing notes for a consultation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsultationOutcome {
    pub confirmatory_diagnosis: String,
    pub treatment_plan: String,
    /// `YYYY-MM-DD`, blank for none
    pub follow_up_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabTestInput {
    pub patient_id: String,
    pub consultation_id: Option<String>,
    pub test_name: String,
    pub test_type: String,
    pub notes: String,
}

pub struct ClinicalService<'a> {
    db: &'a Database,
}

impl<'a> ClinicalService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Open a consultation for the signed-in doctor.
    pub fn start_consultation(&self, input: &ConsultationInput, session: &Session) -> ServiceResult<Consultation> {
        require_role(session, &[StaffRole::Doctor], "start a consultation")?;

        let mut errors = ValidationErrors::new();
        let patient_id = rules::required_text(&mut errors, "patient_id", &input.patient_id, 1);
        let chief_complaint = rules::required_text(&mut errors, "chief_complaint", &input.chief_complaint, 3);
        let (Some(patient_id), Some(chief_complaint)) = (patient_id, chief_complaint) else {
            return Err(errors.into());
        };
        errors.finish(())?;

        require_patient(self.db, &patient_id)?;
        if let Some(appointment_id) = &input.appointment_id {
            if self.db.get_appointment(appointment_id)?.is_none() {
                return Err(ServiceError::NotFound(format!("Appointment {}", appointment_id)));
            }
        }

        let stamp = now_timestamp();
        let consultation = Consultation {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            doctor_id: session.user_id.clone(),
            appointment_id: input.appointment_id.clone(),
            consultation_date: stamp.clone(),
            chief_complaint: Some(chief_complaint),
            signs_and_symptoms: rules::optional_text(&input.signs_and_symptoms),
            initial_diagnosis: rules::optional_text(&input.initial_diagnosis),
            confirmatory_diagnosis: None,
            treatment_plan: None,
            follow_up_date: None,
            status: VisitStatus::InProgress,
            created_at: stamp.clone(),
            updated_at: stamp,
        };

        self.db.insert_consultation(&consultation)?;
        info!(
            "Consultation {} started by {} for patient {}",
            consultation.id, session.user_id, consultation.patient_id
        );
        Ok(consultation)
    }

    /// Record the outcome and close the consultation.
    pub fn complete_consultation(
        &self,
        id: &str,
        outcome: &ConsultationOutcome,
        session: &Session,
    ) -> ServiceResult<Consultation> {
        require_role(session, &[StaffRole::Doctor], "complete a consultation")?;

        let mut consultation = self.get_consultation(id)?;
        if consultation.status.is_terminal() {
            return Err(ServiceError::InvalidTransition {
                from: consultation.status.to_string(),
                to: VisitStatus::Completed.to_string(),
            });
        }

        let mut errors = ValidationErrors::new();
        let follow_up = rules::optional_date(&mut errors, "follow_up_date", &outcome.follow_up_date);
        errors.finish(())?;

        consultation.confirmatory_diagnosis = rules::optional_text(&outcome.confirmatory_diagnosis);
        consultation.treatment_plan = rules::optional_text(&outcome.treatment_plan);
        consultation.follow_up_date = follow_up.map(|d| d.format("%Y-%m-%d").to_string());
        consultation.status = VisitStatus::Completed;
        consultation.updated_at = now_timestamp();

        self.db.update_consultation(&consultation)?;
        info!("Consultation {} completed by {}", id, session.user_id);
        Ok(consultation)
    }

    pub fn get_consultation(&self, id: &str) -> ServiceResult<Consultation> {
        self.db
            .get_consultation(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("Consultation {}", id)))
    }

    pub fn list_consultations_for_patient(&self, patient_id: &str) -> ServiceResult<Vec<Consultation>> {
        Ok(self.db.list_consultations_for_patient(patient_id)?)
    }

    /// Order a lab test. It starts out `requested`.
    pub fn request_lab_test(&self, input: &LabTestInput, session: &Session) -> ServiceResult<LabRequest> {
        let mut errors = ValidationErrors::new();
        let patient_id = rules::required_text(&mut errors, "patient_id", &input.patient_id, 1);
        let test_name = rules::required_text(&mut errors, "test_name", &input.test_name, 2);
        let test_type = rules::required_text(&mut errors, "test_type", &input.test_type, 2);
        let (Some(patient_id), Some(test_name), Some(test_type)) = (patient_id, test_name, test_type) else {
            return Err(errors.into());
        };
        errors.finish(())?;

        require_patient(self.db, &patient_id)?;
        if let Some(consultation_id) = &input.consultation_id {
            self.get_consultation(consultation_id)?;
        }

        let stamp = now_timestamp();
        let lab = LabRequest {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            consultation_id: input.consultation_id.clone(),
            test_name,
            test_type,
            requested_by: session.user_id.clone(),
            requested_at: stamp.clone(),
            performed_by: None,
            results: None,
            notes: rules::optional_text(&input.notes),
            status: TestStatus::Requested,
            completed_at: None,
            created_at: stamp,
        };

        self.db.insert_lab_request(&lab)?;
        info!("Lab test '{}' requested for patient {}", lab.test_name, lab.patient_id);
        Ok(lab)
    }

    pub fn get_lab_request(&self, id: &str) -> ServiceResult<LabRequest> {
        self.db
            .get_lab_request(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("Lab request {}", id)))
    }

    /// Work queue for the lab, oldest first.
    pub fn list_lab_requests(&self, status: TestStatus) -> ServiceResult<Vec<LabRequest>> {
        Ok(self.db.list_lab_requests_by_status(status)?)
    }

    /// Move a lab request to `status`. Completed and cancelled requests are final.
    pub fn update_lab_status(&self, id: &str, status: TestStatus) -> ServiceResult<LabRequest> {
        let mut lab = self.get_lab_request(id)?;
        if lab.status == status {
            debug!("Lab request {} already {}", id, status);
            return Ok(lab);
        }
        if !lab.status.can_transition_to(status) {
            return Err(ServiceError::InvalidTransition {
                from: lab.status.to_string(),
                to: status.to_string(),
            });
        }

        if status == TestStatus::Completed {
            lab.completed_at = Some(now_timestamp());
        }
        lab.status = status;
        self.db.update_lab_request(&lab)?;
        info!("Lab request {} is now {}", id, status);
        Ok(lab)
    }

    /// Attach results and mark the request completed.
    pub fn record_lab_results(&self, id: &str, results: &str, session: &Session) -> ServiceResult<LabRequest> {
        let mut errors = ValidationErrors::new();
        let results = rules::required_text(&mut errors, "results", results, 1);
        let Some(results) = results else {
            return Err(errors.into());
        };

        let mut lab = self.get_lab_request(id)?;
        if lab.status.is_terminal() {
            return Err(ServiceError::InvalidTransition {
                from: lab.status.to_string(),
                to: TestStatus::Completed.to_string(),
            });
        }

        lab.results = Some(results);
        lab.performed_by = Some(session.user_id.clone());
        lab.completed_at = Some(now_timestamp());
        lab.status = TestStatus::Completed;

        self.db.update_lab_request(&lab)?;
        info!("Results recorded for lab request {} by {}", id, session.user_id);
        Ok(lab)
    }
}
