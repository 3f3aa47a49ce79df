//! Bills and payments. Amounts are integer cents.

use chrono::{DateTime, Datelike, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::{require_patient, ServiceError, ServiceResult};
use crate::config::ServiceConfig;
use crate::db::Database;
use crate::identifiers;
use crate::models::{now_timestamp, timestamp, Bill, BillItem, PaymentMethod, PaymentStatus, Session};
use crate::validation::{rules, ValidationErrors};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillItemInput {
    pub item_name: String,
    /// e.g. `consultation`, `lab`, `medication`, `bed`
    pub item_type: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillInput {
    pub patient_id: String,
    pub consultation_id: Option<String>,
    pub admission_id: Option<String>,
    pub items: Vec<BillItemInput>,
    pub discount_cents: i64,
}

pub struct BillingService<'a> {
    db: &'a Database,
    config: &'a ServiceConfig,
}

impl<'a> BillingService<'a> {
    pub fn new(db: &'a Database, config: &'a ServiceConfig) -> Self {
        Self { db, config }
    }

    pub fn create_bill(&self, input: &BillInput, session: &Session) -> ServiceResult<(Bill, Vec<BillItem>)> {
        self.create_bill_at(input, session, Utc::now())
    }

    /// Price the items, number the bill and write it with its items in one transaction.
    pub fn create_bill_at(
        &self,
        input: &BillInput,
        session: &Session,
        now: DateTime<Utc>,
    ) -> ServiceResult<(Bill, Vec<BillItem>)> {
        let mut errors = ValidationErrors::new();
        if input.items.is_empty() {
            errors.push("items", "at least one item is required");
        }

        let mut subtotal: i64 = 0;
        let mut line_totals = Vec::with_capacity(input.items.len());
        for (i, item) in input.items.iter().enumerate() {
            let field = format!("items[{}]", i);
            if item.item_name.trim().is_empty() {
                errors.push(&field, "item_name is required");
            }
            if item.quantity == 0 {
                errors.push(&field, "quantity must be positive");
            }
            if item.unit_price_cents < 0 {
                errors.push(&field, "unit_price_cents cannot be negative");
            }
            let line = item
                .unit_price_cents
                .checked_mul(i64::from(item.quantity))
                .and_then(|line| subtotal.checked_add(line).map(|sum| (line, sum)));
            match line {
                Some((line, sum)) => {
                    subtotal = sum;
                    line_totals.push(line);
                }
                None => {
                    errors.push(&field, "amount is too large");
                    line_totals.push(0);
                }
            }
        }
        if input.discount_cents < 0 {
            errors.push("discount_cents", "cannot be negative");
        } else if input.discount_cents > subtotal {
            errors.push("discount_cents", "cannot exceed the subtotal");
        }
        rules::required_text(&mut errors, "patient_id", &input.patient_id, 1);
        errors.finish(())?;

        require_patient(self.db, &input.patient_id)?;

        let bill_number = identifiers::generate_unique(
            &self.config.bill_number_prefix,
            now.year(),
            self.config.max_identifier_attempts,
            |candidate| self.db.bill_number_exists(candidate),
        )?;

        let total = subtotal - input.discount_cents;
        let stamp = timestamp(now);
        let bill = Bill {
            id: uuid::Uuid::new_v4().to_string(),
            bill_number,
            patient_id: input.patient_id.trim().to_string(),
            consultation_id: input.consultation_id.clone(),
            admission_id: input.admission_id.clone(),
            total_amount_cents: total,
            discount_cents: input.discount_cents,
            paid_amount_cents: 0,
            payment_method: None,
            payment_status: Bill::status_for_paid(total, 0),
            created_by: Some(session.user_id.clone()),
            created_at: stamp.clone(),
            updated_at: stamp.clone(),
        };
        let items: Vec<BillItem> = input
            .items
            .iter()
            .zip(line_totals)
            .map(|(item, total)| BillItem {
                id: uuid::Uuid::new_v4().to_string(),
                bill_id: bill.id.clone(),
                item_name: item.item_name.trim().to_string(),
                item_type: item.item_type.trim().to_string(),
                quantity: item.quantity,
                unit_price_cents: item.unit_price_cents,
                total_price_cents: total,
                created_at: stamp.clone(),
            })
            .collect();

        self.db.insert_bill(&bill, &items)?;
        info!(
            "Created bill {} for patient {}: {} items, total {} cents",
            bill.bill_number,
            bill.patient_id,
            items.len(),
            bill.total_amount_cents
        );
        Ok((bill, items))
    }

    pub fn get_bill(&self, id: &str) -> ServiceResult<Bill> {
        self.db
            .get_bill(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("Bill {}", id)))
    }

    pub fn list_bill_items(&self, bill_id: &str) -> ServiceResult<Vec<BillItem>> {
        Ok(self.db.list_bill_items(bill_id)?)
    }

    pub fn list_bills_for_patient(&self, patient_id: &str) -> ServiceResult<Vec<Bill>> {
        Ok(self.db.list_bills_for_patient(patient_id)?)
    }

    /// Apply a payment. The new status is `partial` or `paid`.
    pub fn record_payment(
        &self,
        bill_id: &str,
        amount_cents: i64,
        method: Option<PaymentMethod>,
    ) -> ServiceResult<Bill> {
        let mut bill = self.get_bill(bill_id)?;
        if bill.payment_status == PaymentStatus::Paid {
            return Err(ServiceError::Conflict(format!(
                "Bill {} is already paid",
                bill.bill_number
            )));
        }

        let mut errors = ValidationErrors::new();
        if amount_cents <= 0 {
            errors.push("amount_cents", "must be positive");
        } else if amount_cents > bill.balance_cents() {
            errors.push(
                "amount_cents",
                format!("exceeds the outstanding balance of {} cents", bill.balance_cents()),
            );
        }
        errors.finish(())?;

        bill.paid_amount_cents += amount_cents;
        bill.payment_status = Bill::status_for_paid(bill.total_amount_cents, bill.paid_amount_cents);
        if method.is_some() {
            bill.payment_method = method;
        }
        bill.updated_at = now_timestamp();

        self.db.update_bill_payment(
            &bill.id,
            bill.paid_amount_cents,
            bill.payment_status,
            method,
            &bill.updated_at,
        )?;
        info!(
            "Payment of {} cents on bill {}; now {}",
            amount_cents, bill.bill_number, bill.payment_status
        );
        Ok(bill)
    }

    /// Flag an unpaid balance as overdue.
    pub fn mark_bill_overdue(&self, bill_id: &str) -> ServiceResult<Bill> {
        let mut bill = self.get_bill(bill_id)?;
        match bill.payment_status {
            PaymentStatus::Pending | PaymentStatus::Partial if bill.balance_cents() > 0 => {}
            other => {
                return Err(ServiceError::InvalidTransition {
                    from: other.to_string(),
                    to: PaymentStatus::Overdue.to_string(),
                })
            }
        }

        bill.payment_status = PaymentStatus::Overdue;
        bill.updated_at = now_timestamp();
        self.db.update_bill_payment(
            &bill.id,
            bill.paid_amount_cents,
            bill.payment_status,
            None,
            &bill.updated_at,
        )?;
        warn!("Bill {} marked overdue with {} cents outstanding", bill.bill_number, bill.balance_cents());
        Ok(bill)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::patients::tests::make_patient;
    use crate::models::StaffRole;
    use crate::service::test_support::session_for;

    fn setup() -> (Database, Session, String) {
        let db = Database::open_in_memory().unwrap();
        let cashier = session_for(&db, "Ann Wambui", StaffRole::Cashier);
        let patient = make_patient("PAT-2024-0001", "Grace Njeri", "2024-01-01T08:00:00.000000Z");
        db.insert_patient(&patient).unwrap();
        (db, cashier, patient.id)
    }

    fn item(name: &str, quantity: u32, unit_price_cents: i64) -> BillItemInput {
        BillItemInput {
            item_name: name.into(),
            item_type: "service".into(),
            quantity,
            unit_price_cents,
        }
    }

    fn input(patient_id: &str) -> BillInput {
        BillInput {
            patient_id: patient_id.into(),
            items: vec![item("Consultation", 1, 150_000), item("Paracetamol 500mg", 20, 500)],
            discount_cents: 10_000,
            ..Default::default()
        }
    }

    #[test]
    fn test_total_is_items_minus_discount() {
        let (db, cashier, patient_id) = setup();
        let config = ServiceConfig::default();
        let service = BillingService::new(&db, &config);

        let (bill, items) = service.create_bill(&input(&patient_id), &cashier).unwrap();
        assert_eq!(bill.total_amount_cents, 150_000 + 10_000 - 10_000);
        assert_eq!(items[1].total_price_cents, 10_000);
        assert_eq!(bill.payment_status, PaymentStatus::Pending);
        assert!(identifiers::parse_identifier(&bill.bill_number, "BILL").is_some());
        assert_eq!(service.list_bill_items(&bill.id).unwrap().len(), 2);
    }

    #[test]
    fn test_rejects_bad_items() {
        let (db, cashier, patient_id) = setup();
        let config = ServiceConfig::default();
        let service = BillingService::new(&db, &config);

        let bad = BillInput {
            patient_id,
            items: vec![item("Bandage", 0, 100), item("Syringe", 1, -5)],
            discount_cents: 1_000,
            ..Default::default()
        };
        let err = service.create_bill(&bad, &cashier).unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert!(errors.has_field("items[0]"));
        assert!(errors.has_field("items[1]"));
        assert!(errors.has_field("discount_cents"));
    }

    #[test]
    fn test_payments_drive_status() {
        let (db, cashier, patient_id) = setup();
        let config = ServiceConfig::default();
        let service = BillingService::new(&db, &config);
        let (bill, _) = service.create_bill(&input(&patient_id), &cashier).unwrap();

        let partial = service.record_payment(&bill.id, 50_000, Some(PaymentMethod::Cash)).unwrap();
        assert_eq!(partial.payment_status, PaymentStatus::Partial);

        let overpay = service.record_payment(&bill.id, 200_000, None);
        assert!(matches!(overpay, Err(ServiceError::Validation(_))));

        let overdue = service.mark_bill_overdue(&bill.id).unwrap();
        assert_eq!(overdue.payment_status, PaymentStatus::Overdue);

        let paid = service.record_payment(&bill.id, 100_000, None).unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
        assert_eq!(paid.payment_method, Some(PaymentMethod::Cash));
        assert_eq!(service.get_bill(&bill.id).unwrap(), paid);

        assert!(matches!(
            service.record_payment(&bill.id, 1, None),
            Err(ServiceError::Conflict(_))
        ));
        assert!(matches!(
            service.mark_bill_overdue(&bill.id),
            Err(ServiceError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_fully_discounted_bill_is_settled() {
        let (db, cashier, patient_id) = setup();
        let config = ServiceConfig::default();
        let service = BillingService::new(&db, &config);

        let free = BillInput {
            patient_id,
            items: vec![item("Antenatal profile", 1, 1_000)],
            discount_cents: 1_000,
            ..Default::default()
        };
        let (bill, _) = service.create_bill(&free, &cashier).unwrap();
        assert_eq!(bill.total_amount_cents, 0);
        assert_eq!(bill.balance_cents(), 0);
        assert_eq!(bill.payment_status, PaymentStatus::Paid);
        assert_eq!(service.get_bill(&bill.id).unwrap().payment_status, PaymentStatus::Paid);

        assert!(matches!(
            service.mark_bill_overdue(&bill.id),
            Err(ServiceError::InvalidTransition { .. })
        ));
        assert!(matches!(
            service.record_payment(&bill.id, 1, None),
            Err(ServiceError::Conflict(_))
        ));
    }
}
