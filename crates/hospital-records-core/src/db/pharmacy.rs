//! Pharmacy inventory and sale operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{Medication, PharmacySale};

const MEDICATION_COLUMNS: &str = r#"
    id, name, generic_name, category, batch_number, expiry_date, quantity_in_stock,
    minimum_stock_level, unit_price_cents, created_at, updated_at
"#;

fn medication_from_row(row: &Row<'_>) -> rusqlite::Result<Medication> {
    Ok(Medication {
        id: row.get(0)?,
        name: row.get(1)?,
        generic_name: row.get(2)?,
        category: row.get(3)?,
        batch_number: row.get(4)?,
        expiry_date: row.get(5)?,
        quantity_in_stock: row.get(6)?,
        minimum_stock_level: row.get(7)?,
        unit_price_cents: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

impl Database {
    /// Insert a medication into inventory.
    pub fn insert_medication(&self, med: &Medication) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO pharmacy_inventory (
                id, name, generic_name, category, batch_number, expiry_date, quantity_in_stock,
                minimum_stock_level, unit_price_cents, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                med.id,
                med.name,
                med.generic_name,
                med.category,
                med.batch_number,
                med.expiry_date,
                med.quantity_in_stock,
                med.minimum_stock_level,
                med.unit_price_cents,
                med.created_at,
                med.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Get a medication by ID.
    pub fn get_medication(&self, id: &str) -> DbResult<Option<Medication>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM pharmacy_inventory WHERE id = ?", MEDICATION_COLUMNS),
                [id],
                medication_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List medications at or below their minimum stock level.
    pub fn list_low_stock_medications(&self) -> DbResult<Vec<Medication>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM pharmacy_inventory
            WHERE quantity_in_stock <= minimum_stock_level
            ORDER BY quantity_in_stock ASC, name
            "#,
            MEDICATION_COLUMNS
        ))?;
        let rows = stmt.query_map([], medication_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Decrement stock and record the sale atomically.
    ///
    /// Fails with `Constraint` when stock would go negative; nothing is written then.
    pub fn record_sale(&self, sale: &PharmacySale, updated_at: &str) -> DbResult<()> {
        let tx = self.write_transaction()?;

        let rows_affected = tx.execute(
            r#"
            UPDATE pharmacy_inventory
            SET quantity_in_stock = quantity_in_stock - ?2, updated_at = ?3
            WHERE id = ?1 AND quantity_in_stock >= ?2
            "#,
            params![sale.medication_id, sale.quantity, updated_at],
        )?;
        if rows_affected == 0 {
            return Err(DbError::Constraint(format!(
                "Insufficient stock for medication {}",
                sale.medication_id
            )));
        }

        tx.execute(
            r#"
            INSERT INTO pharmacy_sales (
                id, medication_id, patient_id, quantity, unit_price_cents, total_price_cents,
                payment_method, sold_by, sale_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                sale.id,
                sale.medication_id,
                sale.patient_id,
                sale.quantity,
                sale.unit_price_cents,
                sale.total_price_cents,
                sale.payment_method,
                sale.sold_by,
                sale.sale_date,
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// List sales of a medication, newest first.
    pub fn list_sales_for_medication(&self, medication_id: &str) -> DbResult<Vec<PharmacySale>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, medication_id, patient_id, quantity, unit_price_cents, total_price_cents,
                   payment_method, sold_by, sale_date
            FROM pharmacy_sales
            WHERE medication_id = ?
            ORDER BY sale_date DESC, rowid DESC
            "#,
        )?;
        let rows = stmt.query_map([medication_id], |row| {
            Ok(PharmacySale {
                id: row.get(0)?,
                medication_id: row.get(1)?,
                patient_id: row.get(2)?,
                quantity: row.get(3)?,
                unit_price_cents: row.get(4)?,
                total_price_cents: row.get(5)?,
                payment_method: row.get(6)?,
                sold_by: row.get(7)?,
                sale_date: row.get(8)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
