//! Appointment models.

use serde::{Deserialize, Serialize};

use super::text_enum;

text_enum! {
    /// Progress of an appointment or consultation.
    VisitStatus, "visit status" {
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

impl VisitStatus {
    /// Completed and cancelled visits are closed for good.
    pub fn is_terminal(&self) -> bool {
        matches!(self, VisitStatus::Completed | VisitStatus::Cancelled)
    }

    /// Any open status may move to any other; terminal ones only to themselves.
    pub fn can_transition_to(&self, next: VisitStatus) -> bool {
        *self == next || !self.is_terminal()
    }
}

/// A scheduled appointment between a patient and a doctor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: Option<String>,
    /// Combined date and time, `YYYY-MM-DDTHH:MM:SS`
    pub appointment_date: String,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub status: VisitStatus,
    pub created_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}
