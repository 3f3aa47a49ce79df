//! Pharmacy inventory and sales.

use serde::{Deserialize, Serialize};

use super::PaymentMethod;

/// A stocked medication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Medication {
    pub id: String,
    pub name: String,
    pub generic_name: Option<String>,
    pub category: Option<String>,
    pub batch_number: Option<String>,
    /// ISO date
    pub expiry_date: Option<String>,
    pub quantity_in_stock: u32,
    pub minimum_stock_level: u32,
    pub unit_price_cents: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl Medication {
    pub fn is_low_stock(&self) -> bool {
        self.quantity_in_stock <= self.minimum_stock_level
    }
}

/// A counter sale of a medication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PharmacySale {
    pub id: String,
    pub medication_id: String,
    pub patient_id: Option<String>,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub total_price_cents: i64,
    pub payment_method: Option<PaymentMethod>,
    pub sold_by: Option<String>,
    pub sale_date: String,
}
