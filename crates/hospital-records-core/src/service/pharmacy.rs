//! Pharmacy stock and sales.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::{require_patient, ServiceError, ServiceResult};
use crate::db::{Database, DbError};
use crate::models::{now_timestamp, Medication, PaymentMethod, PharmacySale, Session};
use crate::validation::{rules, ValidationErrors};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MedicationInput {
    pub name: String,
    pub generic_name: String,
    pub category: String,
    pub batch_number: String,
    /// `YYYY-MM-DD`, blank if unknown
    pub expiry_date: String,
    pub quantity_in_stock: u32,
    pub minimum_stock_level: u32,
    pub unit_price_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleInput {
    pub medication_id: String,
    pub patient_id: Option<String>,
    pub quantity: u32,
    pub payment_method: Option<PaymentMethod>,
}

pub struct PharmacyService<'a> {
    db: &'a Database,
}

impl<'a> PharmacyService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Add a stock line.
    pub fn add_medication(&self, input: &MedicationInput) -> ServiceResult<Medication> {
        let mut errors = ValidationErrors::new();
        let name = rules::required_text(&mut errors, "name", &input.name, 2);
        let expiry = rules::optional_date(&mut errors, "expiry_date", &input.expiry_date);
        if input.unit_price_cents < 0 {
            errors.push("unit_price_cents", "cannot be negative");
        }
        let Some(name) = name else {
            return Err(errors.into());
        };
        errors.finish(())?;

        let stamp = now_timestamp();
        let medication = Medication {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            generic_name: rules::optional_text(&input.generic_name),
            category: rules::optional_text(&input.category),
            batch_number: rules::optional_text(&input.batch_number),
            expiry_date: expiry.map(|d| d.format("%Y-%m-%d").to_string()),
            quantity_in_stock: input.quantity_in_stock,
            minimum_stock_level: input.minimum_stock_level,
            unit_price_cents: input.unit_price_cents,
            created_at: stamp.clone(),
            updated_at: stamp,
        };

        self.db.insert_medication(&medication)?;
        info!(
            "Added medication {} ({} in stock)",
            medication.name, medication.quantity_in_stock
        );
        Ok(medication)
    }

    pub fn get_medication(&self, id: &str) -> ServiceResult<Medication> {
        self.db
            .get_medication(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("Medication {}", id)))
    }

    /// Lines at or below their minimum level.
    pub fn list_low_stock(&self) -> ServiceResult<Vec<Medication>> {
        Ok(self.db.list_low_stock_medications()?)
    }

    /// Sell from stock. Stock check, decrement and sale row happen in one transaction.
    pub fn record_sale(&self, input: &SaleInput, session: &Session) -> ServiceResult<PharmacySale> {
        if input.quantity == 0 {
            let mut errors = ValidationErrors::new();
            errors.push("quantity", "must be positive");
            return Err(errors.into());
        }

        let medication = self.get_medication(&input.medication_id)?;
        let Some(total_price_cents) = medication
            .unit_price_cents
            .checked_mul(i64::from(input.quantity))
        else {
            let mut errors = ValidationErrors::new();
            errors.push("quantity", "sale total is out of range");
            return Err(errors.into());
        };
        if let Some(patient_id) = &input.patient_id {
            require_patient(self.db, patient_id)?;
        }

        let stamp = now_timestamp();
        let sale = PharmacySale {
            id: uuid::Uuid::new_v4().to_string(),
            medication_id: medication.id.clone(),
            patient_id: input.patient_id.clone(),
            quantity: input.quantity,
            unit_price_cents: medication.unit_price_cents,
            total_price_cents,
            payment_method: input.payment_method,
            sold_by: Some(session.user_id.clone()),
            sale_date: stamp.clone(),
        };

        match self.db.record_sale(&sale, &stamp) {
            Ok(()) => {}
            Err(DbError::Constraint(_)) => {
                warn!(
                    "Sale of {} x {} refused: {} in stock",
                    sale.quantity, medication.name, medication.quantity_in_stock
                );
                return Err(ServiceError::Conflict(format!(
                    "Only {} of {} in stock",
                    medication.quantity_in_stock, medication.name
                )));
            }
            Err(e) => return Err(e.into()),
        }

        info!("Sold {} x {} by {}", sale.quantity, medication.name, session.user_id);
        Ok(sale)
    }

    pub fn list_sales_for_medication(&self, medication_id: &str) -> ServiceResult<Vec<PharmacySale>> {
        Ok(self.db.list_sales_for_medication(medication_id)?)
    }
}
