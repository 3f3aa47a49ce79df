//! Ward and admission operations.

use rusqlite::{params, OptionalExtension, Row};

use super::patients::set_patient_type;
use super::{Database, DbError, DbResult};
use crate::models::{Admission, AdmissionStatus, PatientType, Ward};

const WARD_COLUMNS: &str =
    "id, name, ward_type, total_beds, available_beds, created_at, updated_at";

const ADMISSION_COLUMNS: &str = r#"
    id, patient_id, ward_id, consultation_id, bed_number, admission_date, admission_reason,
    admitted_by, discharge_date, discharge_reason, discharged_by, status, created_at, updated_at
"#;

fn ward_from_row(row: &Row<'_>) -> rusqlite::Result<Ward> {
    Ok(Ward {
        id: row.get(0)?,
        name: row.get(1)?,
        ward_type: row.get(2)?,
        total_beds: row.get(3)?,
        available_beds: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn admission_from_row(row: &Row<'_>) -> rusqlite::Result<Admission> {
    Ok(Admission {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        ward_id: row.get(2)?,
        consultation_id: row.get(3)?,
        bed_number: row.get(4)?,
        admission_date: row.get(5)?,
        admission_reason: row.get(6)?,
        admitted_by: row.get(7)?,
        discharge_date: row.get(8)?,
        discharge_reason: row.get(9)?,
        discharged_by: row.get(10)?,
        status: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

impl Database {
    // =========================================================================
    // Wards
    // =========================================================================

    /// Insert a ward.
    pub fn insert_ward(&self, ward: &Ward) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO wards (id, name, ward_type, total_beds, available_beds, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                ward.id,
                ward.name,
                ward.ward_type,
                ward.total_beds,
                ward.available_beds,
                ward.created_at,
                ward.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Get a ward by ID.
    pub fn get_ward(&self, id: &str) -> DbResult<Option<Ward>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM wards WHERE id = ?", WARD_COLUMNS),
                [id],
                ward_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all wards by name.
    pub fn list_wards(&self) -> DbResult<Vec<Ward>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM wards ORDER BY name", WARD_COLUMNS))?;
        let rows = stmt.query_map([], ward_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // =========================================================================
    // Admissions
    // =========================================================================

    /// Take a bed, insert the admission and mark the patient inpatient, atomically.
    pub fn admit(&self, admission: &Admission) -> DbResult<()> {
        let tx = self.write_transaction()?;

        if let Some(ward_id) = &admission.ward_id {
            let rows_affected = tx.execute(
                r#"
                UPDATE wards SET available_beds = available_beds - 1, updated_at = ?2
                WHERE id = ?1 AND available_beds > 0
                "#,
                params![ward_id, admission.created_at],
            )?;
            if rows_affected == 0 {
                return Err(DbError::Constraint(format!("No free beds in ward {}", ward_id)));
            }
        }

        tx.execute(
            &format!(
                "INSERT INTO admissions ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                ADMISSION_COLUMNS
            ),
            params![
                admission.id,
                admission.patient_id,
                admission.ward_id,
                admission.consultation_id,
                admission.bed_number,
                admission.admission_date,
                admission.admission_reason,
                admission.admitted_by,
                admission.discharge_date,
                admission.discharge_reason,
                admission.discharged_by,
                admission.status,
                admission.created_at,
                admission.updated_at,
            ],
        )?;

        set_patient_type(&tx, &admission.patient_id, PatientType::Inpatient, &admission.created_at)?;

        tx.commit()?;
        Ok(())
    }

    /// Close an open admission, free its bed and return the patient to outpatient.
    ///
    /// Returns false if the admission was not open.
    pub fn discharge(&self, admission: &Admission) -> DbResult<bool> {
        let tx = self.write_transaction()?;

        let rows_affected = tx.execute(
            r#"
            UPDATE admissions SET
                status = ?2,
                discharge_date = ?3,
                discharge_reason = ?4,
                discharged_by = ?5,
                updated_at = ?6
            WHERE id = ?1 AND status = 'admitted'
            "#,
            params![
                admission.id,
                admission.status,
                admission.discharge_date,
                admission.discharge_reason,
                admission.discharged_by,
                admission.updated_at,
            ],
        )?;
        if rows_affected == 0 {
            return Ok(false);
        }

        if let Some(ward_id) = &admission.ward_id {
            tx.execute(
                r#"
                UPDATE wards SET available_beds = MIN(available_beds + 1, total_beds), updated_at = ?2
                WHERE id = ?1
                "#,
                params![ward_id, admission.updated_at],
            )?;
        }

        set_patient_type(&tx, &admission.patient_id, PatientType::Outpatient, &admission.updated_at)?;

        tx.commit()?;
        Ok(true)
    }

    /// Get an admission by ID.
    pub fn get_admission(&self, id: &str) -> DbResult<Option<Admission>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM admissions WHERE id = ?", ADMISSION_COLUMNS),
                [id],
                admission_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// The patient's open admission, if any.
    pub fn get_active_admission_for_patient(&self, patient_id: &str) -> DbResult<Option<Admission>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM admissions WHERE patient_id = ?1 AND status = ?2 LIMIT 1",
                    ADMISSION_COLUMNS
                ),
                params![patient_id, AdmissionStatus::Admitted],
                admission_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List open admissions, oldest first.
    pub fn list_active_admissions(&self) -> DbResult<Vec<Admission>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM admissions WHERE status = ? ORDER BY admission_date ASC, rowid ASC",
            ADMISSION_COLUMNS
        ))?;
        let rows = stmt.query_map([AdmissionStatus::Admitted], admission_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
