//! Staff profiles and authenticated sessions.

use serde::{Deserialize, Serialize};

use super::text_enum;

text_enum! {
    /// Role attached to a staff profile.
    StaffRole, "staff role" {
        Admin => "admin",
        Doctor => "doctor",
        Nurse => "nurse",
        LabTech => "lab_tech",
        Pharmacist => "pharmacist",
        Cashier => "cashier",
        Receptionist => "receptionist",
        Security => "security",
    }
}

/// A staff member who can sign in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StaffProfile {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: StaffRole,
    pub created_at: String,
    pub updated_at: String,
}

impl StaffProfile {
    /// Create a new profile with required fields.
    pub fn new(full_name: String, email: String, role: StaffRole) -> Self {
        let now = super::now_timestamp();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            full_name,
            email,
            phone: None,
            address: None,
            role,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// The signed-in actor, passed explicitly to every call that records who did it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub role: StaffRole,
    /// Opaque bearer token; only its digest is persisted
    pub token: String,
    pub created_at: String,
}
