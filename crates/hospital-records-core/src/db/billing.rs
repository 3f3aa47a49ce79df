//! Bill and bill item operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{Bill, BillItem, PaymentMethod, PaymentStatus};

const BILL_COLUMNS: &str = r#"
    id, bill_number, patient_id, consultation_id, admission_id, total_amount_cents,
    discount_cents, paid_amount_cents, payment_method, payment_status, created_by,
    created_at, updated_at
"#;

fn bill_from_row(row: &Row<'_>) -> rusqlite::Result<Bill> {
    Ok(Bill {
        id: row.get(0)?,
        bill_number: row.get(1)?,
        patient_id: row.get(2)?,
        consultation_id: row.get(3)?,
        admission_id: row.get(4)?,
        total_amount_cents: row.get(5)?,
        discount_cents: row.get(6)?,
        paid_amount_cents: row.get(7)?,
        payment_method: row.get(8)?,
        payment_status: row.get(9)?,
        created_by: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

impl Database {
    /// Insert a bill and all of its items atomically.
    pub fn insert_bill(&self, bill: &Bill, items: &[BillItem]) -> DbResult<()> {
        let tx = self.write_transaction()?;

        tx.execute(
            r#"
            INSERT INTO bills (
                id, bill_number, patient_id, consultation_id, admission_id, total_amount_cents,
                discount_cents, paid_amount_cents, payment_method, payment_status, created_by,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                bill.id,
                bill.bill_number,
                bill.patient_id,
                bill.consultation_id,
                bill.admission_id,
                bill.total_amount_cents,
                bill.discount_cents,
                bill.paid_amount_cents,
                bill.payment_method,
                bill.payment_status,
                bill.created_by,
                bill.created_at,
                bill.updated_at,
            ],
        )?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO bill_items (
                    id, bill_id, item_name, item_type, quantity, unit_price_cents,
                    total_price_cents, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )?;
            for item in items {
                stmt.execute(params![
                    item.id,
                    item.bill_id,
                    item.item_name,
                    item.item_type,
                    item.quantity,
                    item.unit_price_cents,
                    item.total_price_cents,
                    item.created_at,
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Get a bill by ID.
    pub fn get_bill(&self, id: &str) -> DbResult<Option<Bill>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM bills WHERE id = ?", BILL_COLUMNS),
                [id],
                bill_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Check whether a bill number is already taken.
    pub fn bill_number_exists(&self, bill_number: &str) -> DbResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM bills WHERE bill_number = ?",
            [bill_number],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// List a patient's bills, newest first.
    pub fn list_bills_for_patient(&self, patient_id: &str) -> DbResult<Vec<Bill>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM bills WHERE patient_id = ? ORDER BY created_at DESC, rowid DESC",
            BILL_COLUMNS
        ))?;
        let rows = stmt.query_map([patient_id], bill_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List the items on a bill in entry order.
    pub fn list_bill_items(&self, bill_id: &str) -> DbResult<Vec<BillItem>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, bill_id, item_name, item_type, quantity, unit_price_cents,
                   total_price_cents, created_at
            FROM bill_items
            WHERE bill_id = ?
            ORDER BY rowid
            "#,
        )?;
        let rows = stmt.query_map([bill_id], |row| {
            Ok(BillItem {
                id: row.get(0)?,
                bill_id: row.get(1)?,
                item_name: row.get(2)?,
                item_type: row.get(3)?,
                quantity: row.get(4)?,
                unit_price_cents: row.get(5)?,
                total_price_cents: row.get(6)?,
                created_at: row.get(7)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Store a new paid amount and payment status.
    pub fn update_bill_payment(
        &self,
        id: &str,
        paid_amount_cents: i64,
        payment_status: PaymentStatus,
        payment_method: Option<PaymentMethod>,
        updated_at: &str,
    ) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE bills SET
                paid_amount_cents = ?2,
                payment_status = ?3,
                payment_method = COALESCE(?4, payment_method),
                updated_at = ?5
            WHERE id = ?1
            "#,
            params![id, paid_amount_cents, payment_status, payment_method, updated_at],
        )?;
        Ok(rows_affected > 0)
    }
}
