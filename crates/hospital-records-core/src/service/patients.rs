//! Patient registration, lookup and search.

use chrono::{DateTime, Datelike, Utc};
use log::{debug, info};
use strsim::jaro_winkler;

use super::{ServiceError, ServiceResult};
use crate::config::ServiceConfig;
use crate::db::Database;
use crate::identifiers;
use crate::models::{timestamp, Patient, Session};
use crate::validation::{validate_patient_form, PatientForm, ValidatedPatient, ValidationRules};

pub struct PatientService<'a> {
    db: &'a Database,
    config: &'a ServiceConfig,
}

impl<'a> PatientService<'a> {
    pub fn new(db: &'a Database, config: &'a ServiceConfig) -> Self {
        Self { db, config }
    }

    /// Every patient, newest registration first.
    pub fn list_patients(&self, session: &Session) -> ServiceResult<Vec<Patient>> {
        let patients = self.db.list_patients()?;
        debug!("Listed {} patients for {}", patients.len(), session.user_id);
        Ok(patients)
    }

    pub fn get_patient(&self, id: &str) -> ServiceResult<Patient> {
        self.db
            .get_patient(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("Patient {}", id)))
    }

    /// Substring hits first, then names that are close by Jaro-Winkler.
    ///
    /// A blank query lists patients newest first, up to `limit`.
    pub fn search_patients(&self, query: &str, limit: usize) -> ServiceResult<Vec<Patient>> {
        let query = query.trim();
        if query.is_empty() {
            let mut all = self.db.list_patients()?;
            all.truncate(limit);
            return Ok(all);
        }

        let mut hits = self.db.search_patients(query, limit)?;
        if hits.len() >= limit {
            return Ok(hits);
        }

        let needle = query.to_lowercase();
        let mut fuzzy: Vec<(f64, Patient)> = self
            .db
            .list_patients()?
            .into_iter()
            .filter(|p| !hits.iter().any(|h| h.id == p.id))
            .filter_map(|p| {
                let score = name_similarity(&needle, &p.full_name);
                (score >= self.config.fuzzy_match_threshold).then_some((score, p))
            })
            .collect();
        fuzzy.sort_by(|a, b| b.0.total_cmp(&a.0));

        debug!(
            "Search '{}': {} substring hits, {} fuzzy hits",
            query,
            hits.len(),
            fuzzy.len()
        );
        hits.extend(fuzzy.into_iter().map(|(_, p)| p).take(limit - hits.len()));
        Ok(hits)
    }

    /// Register a patient as of now.
    pub fn create_patient(&self, form: &PatientForm, session: &Session) -> ServiceResult<Patient> {
        self.create_patient_at(form, session, Utc::now())
    }

    /// Register a patient as of `now`.
    ///
    /// Validation happens before any database access. The patient number is
    /// drawn fresh, checked for collisions, and written with a single insert.
    pub fn create_patient_at(
        &self,
        form: &PatientForm,
        session: &Session,
        now: DateTime<Utc>,
    ) -> ServiceResult<Patient> {
        let validated = validate_patient_form(form, now.date_naive(), &ValidationRules::from(self.config))?;

        let patient_number = identifiers::generate_unique(
            &self.config.patient_number_prefix,
            now.year(),
            self.config.max_identifier_attempts,
            |candidate| self.db.patient_number_exists(candidate),
        )?;

        let stamp = timestamp(now);
        let mut patient = Patient {
            id: uuid::Uuid::new_v4().to_string(),
            patient_number,
            full_name: String::new(),
            date_of_birth: None,
            age: None,
            sex: None,
            phone: None,
            email: None,
            address: None,
            city: None,
            blood_group: None,
            allergies: Vec::new(),
            insurance_company: None,
            insurance_number: None,
            insurance_status: validated.insurance_status,
            patient_type: validated.patient_type,
            registered_by: Some(session.user_id.clone()),
            created_at: stamp.clone(),
            updated_at: stamp,
        };
        apply_form(&mut patient, validated);

        self.db.insert_patient(&patient)?;
        info!(
            "Registered patient {} ({}) by {}",
            patient.patient_number, patient.id, session.user_id
        );
        Ok(patient)
    }

    /// Revalidate the whole form and overwrite the patient's mutable fields.
    ///
    /// Last write wins; concurrent edits are not detected.
    pub fn update_patient(&self, id: &str, form: &PatientForm, session: &Session) -> ServiceResult<Patient> {
        let now = Utc::now();
        let mut patient = self.get_patient(id)?;
        let validated = validate_patient_form(form, now.date_naive(), &ValidationRules::from(self.config))?;

        apply_form(&mut patient, validated);
        patient.updated_at = timestamp(now);

        if !self.db.update_patient(&patient)? {
            return Err(ServiceError::NotFound(format!("Patient {}", id)));
        }
        info!("Updated patient {} by {}", patient.patient_number, session.user_id);
        Ok(patient)
    }
}

fn apply_form(patient: &mut Patient, v: ValidatedPatient) {
    patient.full_name = v.full_name;
    patient.date_of_birth = Some(v.date_of_birth.format("%Y-%m-%d").to_string());
    patient.age = Some(v.age);
    patient.sex = v.sex;
    patient.phone = v.phone;
    patient.email = v.email;
    patient.address = v.address;
    patient.city = v.city;
    patient.blood_group = v.blood_group;
    patient.allergies = v.allergies;
    patient.insurance_company = v.insurance_company;
    patient.insurance_number = v.insurance_number;
    patient.insurance_status = v.insurance_status;
    patient.patient_type = v.patient_type;
}

/// Best Jaro-Winkler score of `needle` against the full name or any one word of it.
fn name_similarity(needle: &str, full_name: &str) -> f64 {
    let name = full_name.to_lowercase();
    name.split_whitespace()
        .map(|word| jaro_winkler(needle, word))
        .fold(jaro_winkler(needle, &name), f64::max)
}
