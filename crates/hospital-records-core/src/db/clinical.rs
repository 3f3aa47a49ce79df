//! Consultation and lab request operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{Consultation, LabRequest, TestStatus};

const CONSULTATION_COLUMNS: &str = r#"
    id, patient_id, doctor_id, appointment_id, consultation_date, chief_complaint,
    signs_and_symptoms, initial_diagnosis, confirmatory_diagnosis, treatment_plan,
    follow_up_date, status, created_at, updated_at
"#;

const LAB_REQUEST_COLUMNS: &str = r#"
    id, patient_id, consultation_id, test_name, test_type, requested_by, requested_at,
    performed_by, results, notes, status, completed_at, created_at
"#;

fn consultation_from_row(row: &Row<'_>) -> rusqlite::Result<Consultation> {
    Ok(Consultation {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        appointment_id: row.get(3)?,
        consultation_date: row.get(4)?,
        chief_complaint: row.get(5)?,
        signs_and_symptoms: row.get(6)?,
        initial_diagnosis: row.get(7)?,
        confirmatory_diagnosis: row.get(8)?,
        treatment_plan: row.get(9)?,
        follow_up_date: row.get(10)?,
        status: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

fn lab_request_from_row(row: &Row<'_>) -> rusqlite::Result<LabRequest> {
    Ok(LabRequest {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        consultation_id: row.get(2)?,
        test_name: row.get(3)?,
        test_type: row.get(4)?,
        requested_by: row.get(5)?,
        requested_at: row.get(6)?,
        performed_by: row.get(7)?,
        results: row.get(8)?,
        notes: row.get(9)?,
        status: row.get(10)?,
        completed_at: row.get(11)?,
        created_at: row.get(12)?,
    })
}

impl Database {
    // =========================================================================
    // Consultations
    // =========================================================================

    /// Insert a new consultation.
    pub fn insert_consultation(&self, c: &Consultation) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO consultations (
                id, patient_id, doctor_id, appointment_id, consultation_date, chief_complaint,
                signs_and_symptoms, initial_diagnosis, confirmatory_diagnosis, treatment_plan,
                follow_up_date, status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                c.id,
                c.patient_id,
                c.doctor_id,
                c.appointment_id,
                c.consultation_date,
                c.chief_complaint,
                c.signs_and_symptoms,
                c.initial_diagnosis,
                c.confirmatory_diagnosis,
                c.treatment_plan,
                c.follow_up_date,
                c.status,
                c.created_at,
                c.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Overwrite a consultation's clinical notes and status.
    pub fn update_consultation(&self, c: &Consultation) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE consultations SET
                chief_complaint = ?2,
                signs_and_symptoms = ?3,
                initial_diagnosis = ?4,
                confirmatory_diagnosis = ?5,
                treatment_plan = ?6,
                follow_up_date = ?7,
                status = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
            params![
                c.id,
                c.chief_complaint,
                c.signs_and_symptoms,
                c.initial_diagnosis,
                c.confirmatory_diagnosis,
                c.treatment_plan,
                c.follow_up_date,
                c.status,
                c.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a consultation by ID.
    pub fn get_consultation(&self, id: &str) -> DbResult<Option<Consultation>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM consultations WHERE id = ?", CONSULTATION_COLUMNS),
                [id],
                consultation_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List a patient's consultations, newest first.
    pub fn list_consultations_for_patient(&self, patient_id: &str) -> DbResult<Vec<Consultation>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM consultations WHERE patient_id = ? ORDER BY consultation_date DESC, rowid DESC",
            CONSULTATION_COLUMNS
        ))?;
        let rows = stmt.query_map([patient_id], consultation_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // =========================================================================
    // Lab Requests
    // =========================================================================

    /// Insert a new lab request.
    pub fn insert_lab_request(&self, lab: &LabRequest) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO lab_requests (
                id, patient_id, consultation_id, test_name, test_type, requested_by, requested_at,
                performed_by, results, notes, status, completed_at, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                lab.id,
                lab.patient_id,
                lab.consultation_id,
                lab.test_name,
                lab.test_type,
                lab.requested_by,
                lab.requested_at,
                lab.performed_by,
                lab.results,
                lab.notes,
                lab.status,
                lab.completed_at,
                lab.created_at,
            ],
        )?;
        Ok(())
    }

    /// Get a lab request by ID.
    pub fn get_lab_request(&self, id: &str) -> DbResult<Option<LabRequest>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM lab_requests WHERE id = ?", LAB_REQUEST_COLUMNS),
                [id],
                lab_request_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List lab requests in a given status, oldest request first.
    pub fn list_lab_requests_by_status(&self, status: TestStatus) -> DbResult<Vec<LabRequest>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM lab_requests WHERE status = ? ORDER BY requested_at ASC, rowid ASC",
            LAB_REQUEST_COLUMNS
        ))?;
        let rows = stmt.query_map([status], lab_request_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Set status, results, performer and completion time of a lab request.
    pub fn update_lab_request(&self, lab: &LabRequest) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE lab_requests SET
                status = ?2,
                performed_by = ?3,
                results = ?4,
                notes = ?5,
                completed_at = ?6
            WHERE id = ?1
            "#,
            params![
                lab.id,
                lab.status,
                lab.performed_by,
                lab.results,
                lab.notes,
                lab.completed_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }
}
