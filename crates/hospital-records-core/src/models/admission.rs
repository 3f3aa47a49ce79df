//! Wards and admissions.

use serde::{Deserialize, Serialize};

use super::text_enum;

text_enum! {
    /// How an admission ended, or `Admitted` while it is open.
    AdmissionStatus, "admission status" {
        Admitted => "admitted",
        Discharged => "discharged",
        Deceased => "deceased",
        Referred => "referred",
    }
}

impl AdmissionStatus {
    pub fn is_active(&self) -> bool {
        *self == AdmissionStatus::Admitted
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ward {
    pub id: String,
    pub name: String,
    pub ward_type: Option<String>,
    pub total_beds: u32,
    pub available_beds: u32,
    pub created_at: String,
    pub updated_at: String,
}

impl Ward {
    pub fn occupied_beds(&self) -> u32 {
        self.total_beds.saturating_sub(self.available_beds)
    }
}

/// A patient's stay in a ward bed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Admission {
    pub id: String,
    pub patient_id: String,
    pub ward_id: Option<String>,
    pub consultation_id: Option<String>,
    pub bed_number: Option<String>,
    pub admission_date: String,
    pub admission_reason: Option<String>,
    pub admitted_by: Option<String>,
    pub discharge_date: Option<String>,
    pub discharge_reason: Option<String>,
    pub discharged_by: Option<String>,
    pub status: AdmissionStatus,
    pub created_at: String,
    pub updated_at: String,
}
