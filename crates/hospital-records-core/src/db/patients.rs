//! Patient database operations.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{
    BloodGroup, InsuranceStatus, Patient, PatientType, Sex,
};

const PATIENT_COLUMNS: &str = r#"
    id, patient_number, full_name, date_of_birth, age, sex, phone, email,
    address, city, blood_group, allergies, insurance_company, insurance_number,
    insurance_status, patient_type, registered_by, created_at, updated_at
"#;

/// Set only the patient type. Takes a connection so admission and discharge
/// can run it inside their transaction.
pub(crate) fn set_patient_type(
    conn: &Connection,
    patient_id: &str,
    patient_type: PatientType,
    updated_at: &str,
) -> DbResult<bool> {
    let rows_affected = conn.execute(
        "UPDATE patients SET patient_type = ?2, updated_at = ?3 WHERE id = ?1",
        params![patient_id, patient_type, updated_at],
    )?;
    Ok(rows_affected > 0)
}

impl Database {
    /// Insert a new patient.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<()> {
        let allergies_json = serde_json::to_string(&patient.allergies)?;

        self.conn.execute(
            r#"
            INSERT INTO patients (
                id, patient_number, full_name, date_of_birth, age, sex, phone, email,
                address, city, blood_group, allergies, insurance_company, insurance_number,
                insurance_status, patient_type, registered_by, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)
            "#,
            params![
                patient.id,
                patient.patient_number,
                patient.full_name,
                patient.date_of_birth,
                patient.age,
                patient.sex,
                patient.phone,
                patient.email,
                patient.address,
                patient.city,
                patient.blood_group,
                allergies_json,
                patient.insurance_company,
                patient.insurance_number,
                patient.insurance_status,
                patient.patient_type,
                patient.registered_by,
                patient.created_at,
                patient.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Overwrite the mutable fields of an existing patient.
    ///
    /// Last write wins: there is no version check.
    pub fn update_patient(&self, patient: &Patient) -> DbResult<bool> {
        let allergies_json = serde_json::to_string(&patient.allergies)?;

        let rows_affected = self.conn.execute(
            r#"
            UPDATE patients SET
                full_name = ?2,
                date_of_birth = ?3,
                age = ?4,
                sex = ?5,
                phone = ?6,
                email = ?7,
                address = ?8,
                city = ?9,
                blood_group = ?10,
                allergies = ?11,
                insurance_company = ?12,
                insurance_number = ?13,
                insurance_status = ?14,
                patient_type = ?15,
                updated_at = ?16
            WHERE id = ?1
            "#,
            params![
                patient.id,
                patient.full_name,
                patient.date_of_birth,
                patient.age,
                patient.sex,
                patient.phone,
                patient.email,
                patient.address,
                patient.city,
                patient.blood_group,
                allergies_json,
                patient.insurance_company,
                patient.insurance_number,
                patient.insurance_status,
                patient.patient_type,
                patient.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a patient by internal ID.
    pub fn get_patient(&self, id: &str) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM patients WHERE id = ?", PATIENT_COLUMNS),
                [id],
                PatientRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Get a patient by human-readable number.
    pub fn get_patient_by_number(&self, patient_number: &str) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM patients WHERE patient_number = ?",
                    PATIENT_COLUMNS
                ),
                [patient_number],
                PatientRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Check whether a patient number is already taken.
    pub fn patient_number_exists(&self, patient_number: &str) -> DbResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM patients WHERE patient_number = ?",
            [patient_number],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Check whether a patient exists.
    pub fn patient_exists(&self, id: &str) -> DbResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM patients WHERE id = ?",
            [id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// List all patients, newest registration first.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM patients ORDER BY created_at DESC, rowid DESC",
            PATIENT_COLUMNS
        ))?;

        let rows = stmt.query_map([], PatientRow::from_row)?;

        let mut patients = Vec::new();
        for row in rows {
            patients.push(row?.try_into()?);
        }
        Ok(patients)
    }

    /// Substring search over name, patient number and phone.
    ///
    /// Name and number match case-insensitively; phone matches verbatim.
    pub fn search_patients(&self, query: &str, limit: usize) -> DbResult<Vec<Patient>> {
        let escaped = query
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let pattern = format!("%{}%", escaped);

        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM patients
            WHERE full_name LIKE ?1 ESCAPE '\'
               OR patient_number LIKE ?1 ESCAPE '\'
               OR instr(phone, ?2) > 0
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?3
            "#,
            PATIENT_COLUMNS
        ))?;

        let rows = stmt.query_map(
            params![pattern, query, limit as i64],
            PatientRow::from_row,
        )?;

        let mut patients = Vec::new();
        for row in rows {
            patients.push(row?.try_into()?);
        }
        Ok(patients)
    }
}

/// Intermediate row struct for database mapping.
struct PatientRow {
    id: String,
    patient_number: String,
    full_name: String,
    date_of_birth: Option<String>,
    age: Option<u32>,
    sex: Option<Sex>,
    phone: Option<String>,
    email: Option<String>,
    address: Option<String>,
    city: Option<String>,
    blood_group: Option<BloodGroup>,
    allergies: String,
    insurance_company: Option<String>,
    insurance_number: Option<String>,
    insurance_status: InsuranceStatus,
    patient_type: PatientType,
    registered_by: Option<String>,
    created_at: String,
    updated_at: String,
}

impl PatientRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            patient_number: row.get(1)?,
            full_name: row.get(2)?,
            date_of_birth: row.get(3)?,
            age: row.get(4)?,
            sex: row.get(5)?,
            phone: row.get(6)?,
            email: row.get(7)?,
            address: row.get(8)?,
            city: row.get(9)?,
            blood_group: row.get(10)?,
            allergies: row.get(11)?,
            insurance_company: row.get(12)?,
            insurance_number: row.get(13)?,
            insurance_status: row.get(14)?,
            patient_type: row.get(15)?,
            registered_by: row.get(16)?,
            created_at: row.get(17)?,
            updated_at: row.get(18)?,
        })
    }
}

impl TryFrom<PatientRow> for Patient {
    type Error = DbError;

    fn try_from(row: PatientRow) -> Result<Self, Self::Error> {
        let allergies: Vec<String> = serde_json::from_str(&row.allergies)?;

        Ok(Patient {
            id: row.id,
            patient_number: row.patient_number,
            full_name: row.full_name,
            date_of_birth: row.date_of_birth,
            age: row.age,
            sex: row.sex,
            phone: row.phone,
            email: row.email,
            address: row.address,
            city: row.city,
            blood_group: row.blood_group,
            allergies,
            insurance_company: row.insurance_company,
            insurance_number: row.insurance_number,
            insurance_status: row.insurance_status,
            patient_type: row.patient_type,
            registered_by: row.registered_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    pub(crate) fn make_patient(number: &str, name: &str, created_at: &str) -> Patient {
        Patient {
            id: uuid::Uuid::new_v4().to_string(),
            patient_number: number.into(),
            full_name: name.into(),
            date_of_birth: Some("1990-05-20".into()),
            age: Some(34),
            sex: Some(Sex::Female),
            phone: Some("+254 712 345 678".into()),
            email: None,
            address: None,
            city: Some("Nairobi".into()),
            blood_group: Some(BloodGroup::OPositive),
            allergies: vec!["penicillin".into()],
            insurance_company: None,
            insurance_number: None,
            insurance_status: InsuranceStatus::None,
            patient_type: PatientType::Outpatient,
            registered_by: None,
            created_at: created_at.into(),
            updated_at: created_at.into(),
        }
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup_db();
        let patient = make_patient("PAT-2024-0001", "Jane Wanjiku", "2024-01-01T08:00:00.000000Z");
        db.insert_patient(&patient).unwrap();

        let retrieved = db.get_patient(&patient.id).unwrap().unwrap();
        assert_eq!(retrieved, patient);

        let by_number = db.get_patient_by_number("PAT-2024-0001").unwrap().unwrap();
        assert_eq!(by_number.id, patient.id);
        assert!(db.patient_number_exists("PAT-2024-0001").unwrap());
        assert!(!db.patient_number_exists("PAT-2024-0002").unwrap());
    }

    #[test]
    fn test_duplicate_number_rejected() {
        let db = setup_db();
        db.insert_patient(&make_patient("PAT-2024-0001", "A One", "2024-01-01T08:00:00.000000Z"))
            .unwrap();
        let err = db
            .insert_patient(&make_patient("PAT-2024-0001", "B Two", "2024-01-01T09:00:00.000000Z"))
            .unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_list_newest_first() {
        let db = setup_db();
        db.insert_patient(&make_patient("PAT-2024-0001", "Older", "2024-01-01T08:00:00.000000Z"))
            .unwrap();
        db.insert_patient(&make_patient("PAT-2024-0002", "Newer", "2024-02-01T08:00:00.000000Z"))
            .unwrap();
        // Same timestamp as "Newer": insertion order breaks the tie
        db.insert_patient(&make_patient("PAT-2024-0003", "Newest", "2024-02-01T08:00:00.000000Z"))
            .unwrap();

        let names: Vec<_> = db
            .list_patients()
            .unwrap()
            .into_iter()
            .map(|p| p.full_name)
            .collect();
        assert_eq!(names, vec!["Newest", "Newer", "Older"]);
    }

    #[test]
    fn test_update_patient() {
        let db = setup_db();
        let mut patient = make_patient("PAT-2024-0001", "Jane", "2024-01-01T08:00:00.000000Z");
        db.insert_patient(&patient).unwrap();

        patient.insurance_status = InsuranceStatus::Expired;
        patient.allergies.push("latex".into());
        patient.updated_at = "2024-03-01T08:00:00.000000Z".into();
        assert!(db.update_patient(&patient).unwrap());

        let retrieved = db.get_patient(&patient.id).unwrap().unwrap();
        assert_eq!(retrieved.insurance_status, InsuranceStatus::Expired);
        assert_eq!(retrieved.allergies, vec!["penicillin", "latex"]);
        assert_eq!(retrieved.created_at, "2024-01-01T08:00:00.000000Z");
    }

    #[test]
    fn test_search_patients() {
        let db = setup_db();
        db.insert_patient(&make_patient("PAT-2024-0001", "Mary Achieng", "2024-01-01T08:00:00.000000Z"))
            .unwrap();
        db.insert_patient(&make_patient("PAT-2024-0002", "Marion Otieno", "2024-01-02T08:00:00.000000Z"))
            .unwrap();
        db.insert_patient(&make_patient("PAT-2024-0003", "Peter Kamau", "2024-01-03T08:00:00.000000Z"))
            .unwrap();

        assert_eq!(db.search_patients("mar", 10).unwrap().len(), 2);
        assert_eq!(db.search_patients("0003", 10).unwrap()[0].full_name, "Peter Kamau");
        assert_eq!(db.search_patients("712 345", 10).unwrap().len(), 3);
        assert_eq!(db.search_patients("%", 10).unwrap().len(), 0);
        assert_eq!(db.search_patients("mar", 1).unwrap().len(), 1);
    }

    #[test]
    fn test_set_patient_type() {
        let db = setup_db();
        let patient = make_patient("PAT-2024-0005", "Mary Wanjiku", "2024-01-01T08:00:00.000000Z");
        db.insert_patient(&patient).unwrap();

        let later = "2024-01-02T08:00:00.000000Z";
        assert!(set_patient_type(db.conn(), &patient.id, PatientType::Inpatient, later).unwrap());
        let stored = db.get_patient(&patient.id).unwrap().unwrap();
        assert_eq!(stored.patient_type, PatientType::Inpatient);
        assert_eq!(stored.updated_at, later);

        assert!(!set_patient_type(db.conn(), "missing", PatientType::Outpatient, later).unwrap());
    }
}
