//! Maternity and optical record operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{EyePrescription, MaternityRecord, OpticalInventoryItem, OpticalRecord};

const OPTICAL_ITEM_COLUMNS: &str =
    "id, item_name, item_type, brand, stock_quantity, unit_price_cents, created_at, updated_at";

fn optical_item_from_row(row: &Row<'_>) -> rusqlite::Result<OpticalInventoryItem> {
    Ok(OpticalInventoryItem {
        id: row.get(0)?,
        item_name: row.get(1)?,
        item_type: row.get(2)?,
        brand: row.get(3)?,
        stock_quantity: row.get(4)?,
        unit_price_cents: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

impl Database {
    /// Insert a maternity record.
    pub fn insert_maternity_record(&self, r: &MaternityRecord) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO maternity_records (
                id, patient_id, doctor_id, visit_type, gestational_age_weeks, weight_kg,
                blood_pressure, fetal_heart_rate, fundal_height_cm, delivery_date,
                baby_weight_kg, birth_outcome, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                r.id,
                r.patient_id,
                r.doctor_id,
                r.visit_type,
                r.gestational_age_weeks,
                r.weight_kg,
                r.blood_pressure,
                r.fetal_heart_rate,
                r.fundal_height_cm,
                r.delivery_date,
                r.baby_weight_kg,
                r.birth_outcome,
                r.notes,
                r.created_at,
            ],
        )?;
        Ok(())
    }

    /// List a patient's maternity records, newest first.
    pub fn list_maternity_records(&self, patient_id: &str) -> DbResult<Vec<MaternityRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, patient_id, doctor_id, visit_type, gestational_age_weeks, weight_kg,
                   blood_pressure, fetal_heart_rate, fundal_height_cm, delivery_date,
                   baby_weight_kg, birth_outcome, notes, created_at
            FROM maternity_records
            WHERE patient_id = ?
            ORDER BY created_at DESC, rowid DESC
            "#,
        )?;
        let rows = stmt.query_map([patient_id], |row| {
            Ok(MaternityRecord {
                id: row.get(0)?,
                patient_id: row.get(1)?,
                doctor_id: row.get(2)?,
                visit_type: row.get(3)?,
                gestational_age_weeks: row.get(4)?,
                weight_kg: row.get(5)?,
                blood_pressure: row.get(6)?,
                fetal_heart_rate: row.get(7)?,
                fundal_height_cm: row.get(8)?,
                delivery_date: row.get(9)?,
                baby_weight_kg: row.get(10)?,
                birth_outcome: row.get(11)?,
                notes: row.get(12)?,
                created_at: row.get(13)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Insert an optical exam record.
    pub fn insert_optical_record(&self, r: &OpticalRecord) -> DbResult<()> {
        let od_json = serde_json::to_string(&r.prescription_od)?;
        let os_json = serde_json::to_string(&r.prescription_os)?;

        self.conn.execute(
            r#"
            INSERT INTO optical_records (
                id, patient_id, doctor_id, visual_acuity_od_distance, visual_acuity_os_distance,
                visual_acuity_od_near, visual_acuity_os_near, prescription_od, prescription_os,
                pd_distance, next_visit_date, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                r.id,
                r.patient_id,
                r.doctor_id,
                r.visual_acuity_od_distance,
                r.visual_acuity_os_distance,
                r.visual_acuity_od_near,
                r.visual_acuity_os_near,
                od_json,
                os_json,
                r.pd_distance,
                r.next_visit_date,
                r.notes,
                r.created_at,
            ],
        )?;
        Ok(())
    }

    /// List a patient's optical exams, newest first.
    pub fn list_optical_records(&self, patient_id: &str) -> DbResult<Vec<OpticalRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, patient_id, doctor_id, visual_acuity_od_distance, visual_acuity_os_distance,
                   visual_acuity_od_near, visual_acuity_os_near, prescription_od, prescription_os,
                   pd_distance, next_visit_date, notes, created_at
            FROM optical_records
            WHERE patient_id = ?
            ORDER BY created_at DESC, rowid DESC
            "#,
        )?;
        let rows = stmt.query_map([patient_id], OpticalRow::from_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.try_into()?);
        }
        Ok(records)
    }

    /// Insert an optical shop stock line.
    pub fn insert_optical_item(&self, item: &OpticalInventoryItem) -> DbResult<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO optical_inventory ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                OPTICAL_ITEM_COLUMNS
            ),
            params![
                item.id,
                item.item_name,
                item.item_type,
                item.brand,
                item.stock_quantity,
                item.unit_price_cents,
                item.created_at,
                item.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_optical_item(&self, id: &str) -> DbResult<Option<OpticalInventoryItem>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM optical_inventory WHERE id = ?", OPTICAL_ITEM_COLUMNS),
                [id],
                optical_item_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// All optical stock lines, newest first.
    pub fn list_optical_inventory(&self) -> DbResult<Vec<OpticalInventoryItem>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM optical_inventory ORDER BY created_at DESC, rowid DESC",
            OPTICAL_ITEM_COLUMNS
        ))?;
        let rows = stmt.query_map([], optical_item_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

/// Intermediate row struct for database mapping.
struct OpticalRow {
    id: String,
    patient_id: String,
    doctor_id: Option<String>,
    visual_acuity_od_distance: Option<String>,
    visual_acuity_os_distance: Option<String>,
    visual_acuity_od_near: Option<String>,
    visual_acuity_os_near: Option<String>,
    prescription_od: String,
    prescription_os: String,
    pd_distance: Option<f64>,
    next_visit_date: Option<String>,
    notes: Option<String>,
    created_at: String,
}

impl OpticalRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            doctor_id: row.get(2)?,
            visual_acuity_od_distance: row.get(3)?,
            visual_acuity_os_distance: row.get(4)?,
            visual_acuity_od_near: row.get(5)?,
            visual_acuity_os_near: row.get(6)?,
            prescription_od: row.get(7)?,
            prescription_os: row.get(8)?,
            pd_distance: row.get(9)?,
            next_visit_date: row.get(10)?,
            notes: row.get(11)?,
            created_at: row.get(12)?,
        })
    }
}

impl TryFrom<OpticalRow> for OpticalRecord {
    type Error = DbError;

    fn try_from(row: OpticalRow) -> Result<Self, Self::Error> {
        let prescription_od: EyePrescription = serde_json::from_str(&row.prescription_od)?;
        let prescription_os: EyePrescription = serde_json::from_str(&row.prescription_os)?;

        Ok(OpticalRecord {
            id: row.id,
            patient_id: row.patient_id,
            doctor_id: row.doctor_id,
            visual_acuity_od_distance: row.visual_acuity_od_distance,
            visual_acuity_os_distance: row.visual_acuity_os_distance,
            visual_acuity_od_near: row.visual_acuity_od_near,
            visual_acuity_os_near: row.visual_acuity_os_near,
            prescription_od,
            prescription_os,
            pd_distance: row.pd_distance,
            next_visit_date: row.next_visit_date,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}
