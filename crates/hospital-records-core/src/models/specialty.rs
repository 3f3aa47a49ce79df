//! Specialty clinic records (maternity, optical).

use serde::{Deserialize, Serialize};

use super::text_enum;

text_enum! {
    MaternityVisitType, "maternity visit type" {
        Antenatal => "antenatal",
        Delivery => "delivery",
    }
}

/// An antenatal visit or a delivery. Fields not relevant to the visit type are `None`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MaternityRecord {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: Option<String>,
    pub visit_type: MaternityVisitType,
    // Antenatal
    pub gestational_age_weeks: Option<u32>,
    pub weight_kg: Option<f64>,
    pub blood_pressure: Option<String>,
    pub fetal_heart_rate: Option<u32>,
    pub fundal_height_cm: Option<f64>,
    // Delivery
    pub delivery_date: Option<String>,
    pub baby_weight_kg: Option<f64>,
    pub birth_outcome: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
}

/// Refraction values for one eye.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EyePrescription {
    pub sphere: Option<f64>,
    pub cylinder: Option<f64>,
    /// Degrees, 0-180
    pub axis: Option<u32>,
    pub add: Option<f64>,
}

/// An eye examination. OD is the right eye, OS the left.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpticalRecord {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: Option<String>,
    /// Snellen notation, e.g. "6/6"
    pub visual_acuity_od_distance: Option<String>,
    pub visual_acuity_os_distance: Option<String>,
    pub visual_acuity_od_near: Option<String>,
    pub visual_acuity_os_near: Option<String>,
    pub prescription_od: EyePrescription,
    pub prescription_os: EyePrescription,
    /// Pupillary distance in mm
    pub pd_distance: Option<f64>,
    pub next_visit_date: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
}

/// A stock line in the optical shop: frames, lenses, solutions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpticalInventoryItem {
    pub id: String,
    pub item_name: String,
    /// Free text, e.g. `frame` or `lens`
    pub item_type: String,
    pub brand: Option<String>,
    pub stock_quantity: u32,
    pub unit_price_cents: i64,
    pub created_at: String,
    pub updated_at: String,
}
