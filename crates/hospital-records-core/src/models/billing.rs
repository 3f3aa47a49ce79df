//! Billing models.
//!
//! Amounts are integer minor units (cents).

use serde::{Deserialize, Serialize};

use super::text_enum;

text_enum! {
    PaymentStatus, "payment status" {
        Pending => "pending",
        Partial => "partial",
        Paid => "paid",
        Overdue => "overdue",
    }
}

text_enum! {
    PaymentMethod, "payment method" {
        Cash => "cash",
        Credit => "credit",
        Insurance => "insurance",
        Deposit => "deposit",
    }
}

/// A patient bill.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bill {
    pub id: String,
    /// Human-readable number, e.g. `BILL-2024-0007`
    pub bill_number: String,
    pub patient_id: String,
    pub consultation_id: Option<String>,
    pub admission_id: Option<String>,
    /// Amount due after discount
    pub total_amount_cents: i64,
    pub discount_cents: i64,
    pub paid_amount_cents: i64,
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: PaymentStatus,
    pub created_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Bill {
    pub fn balance_cents(&self) -> i64 {
        self.total_amount_cents - self.paid_amount_cents
    }

    /// Status implied by the amounts alone.
    pub fn status_for_paid(total_cents: i64, paid_cents: i64) -> PaymentStatus {
        if paid_cents >= total_cents {
            PaymentStatus::Paid
        } else if paid_cents > 0 {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Pending
        }
    }
}

/// One line on a bill.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillItem {
    pub id: String,
    pub bill_id: String,
    pub item_name: String,
    /// Free-form category, e.g. "consultation", "lab", "drug"
    pub item_type: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub total_price_cents: i64,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_for_paid() {
        assert_eq!(Bill::status_for_paid(1000, 0), PaymentStatus::Pending);
        assert_eq!(Bill::status_for_paid(1000, 1), PaymentStatus::Partial);
        assert_eq!(Bill::status_for_paid(1000, 1000), PaymentStatus::Paid);
        // A fully discounted bill is settled
        assert_eq!(Bill::status_for_paid(0, 0), PaymentStatus::Paid);
    }
}
