//! Consultation and laboratory models.

use serde::{Deserialize, Serialize};

use super::{text_enum, VisitStatus};

/// A doctor's consultation with a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Consultation {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub appointment_id: Option<String>,
    pub consultation_date: String,
    pub chief_complaint: Option<String>,
    pub signs_and_symptoms: Option<String>,
    pub initial_diagnosis: Option<String>,
    pub confirmatory_diagnosis: Option<String>,
    pub treatment_plan: Option<String>,
    /// ISO date
    pub follow_up_date: Option<String>,
    pub status: VisitStatus,
    pub created_at: String,
    pub updated_at: String,
}

text_enum! {
    /// Lifecycle of a lab request.
    TestStatus, "test status" {
        Requested => "requested",
        Paid => "paid",
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

impl TestStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TestStatus::Completed | TestStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: TestStatus) -> bool {
        *self == next || !self.is_terminal()
    }
}

/// A laboratory test ordered for a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabRequest {
    pub id: String,
    pub patient_id: String,
    pub consultation_id: Option<String>,
    pub test_name: String,
    pub test_type: String,
    pub requested_by: String,
    pub requested_at: String,
    pub performed_by: Option<String>,
    pub results: Option<String>,
    pub notes: Option<String>,
    pub status: TestStatus,
    pub completed_at: Option<String>,
    pub created_at: String,
}
