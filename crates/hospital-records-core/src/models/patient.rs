//! Patient models.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::text_enum;

text_enum! {
    /// Administrative sex recorded at registration.
    Sex, "sex" {
        Male => "Male",
        Female => "Female",
        Other => "Other",
    }
}

text_enum! {
    /// Validity of the patient's insurance cover.
    InsuranceStatus, "insurance status" {
        None => "none",
        Active => "active",
        Expired => "expired",
    }
}

text_enum! {
    /// Whether the patient currently occupies a bed.
    PatientType, "patient type" {
        Outpatient => "outpatient",
        Inpatient => "inpatient",
    }
}

text_enum! {
    /// ABO/Rh blood group.
    BloodGroup, "blood group" {
        APositive => "A+",
        ANegative => "A-",
        BPositive => "B+",
        BNegative => "B-",
        AbPositive => "AB+",
        AbNegative => "AB-",
        OPositive => "O+",
        ONegative => "O-",
    }
}

/// A registered patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Internal UUID
    pub id: String,
    /// Human-readable number, e.g. `PAT-2024-0042`. Never reassigned.
    pub patient_number: String,
    pub full_name: String,
    /// ISO date (`YYYY-MM-DD`)
    pub date_of_birth: Option<String>,
    pub age: Option<u32>,
    pub sex: Option<Sex>,
    /// Stored exactly as entered (trimmed only)
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub blood_group: Option<BloodGroup>,
    pub allergies: Vec<String>,
    pub insurance_company: Option<String>,
    pub insurance_number: Option<String>,
    pub insurance_status: InsuranceStatus,
    pub patient_type: PatientType,
    /// Staff profile that registered the patient
    pub registered_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Completed years between `dob` and `today`.
///
/// The birthday has to have been reached this year for it to count, so
/// 2000-06-15 is 23 on 2024-06-14 and 24 on 2024-06-15. A 29 February birthday
/// is reached on 1 March in non-leap years. Returns 0 when `today` precedes `dob`.
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> u32 {
    if today < dob {
        return 0;
    }
    let mut years = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        years -= 1;
    }
    years.max(0) as u32
}
