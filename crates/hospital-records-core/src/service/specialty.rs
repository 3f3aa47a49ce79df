//! Maternity and optical clinic records.

use log::info;
use serde::{Deserialize, Serialize};

use super::{require_patient, ServiceError, ServiceResult};
use crate::db::Database;
use crate::models::{
    now_timestamp, EyePrescription, MaternityRecord, MaternityVisitType, OpticalInventoryItem,
    OpticalRecord, Session,
};
use crate::validation::{rules, ValidationErrors};

/// Longest pregnancy accepted, in weeks.
pub const MAX_GESTATIONAL_WEEKS: u32 = 45;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AntenatalVisitInput {
    pub patient_id: String,
    pub gestational_age_weeks: Option<u32>,
    pub weight_kg: Option<f64>,
    /// e.g. `120/80`
    pub blood_pressure: String,
    pub fetal_heart_rate: Option<u32>,
    pub fundal_height_cm: Option<f64>,
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryInput {
    pub patient_id: String,
    /// `YYYY-MM-DD`
    pub delivery_date: String,
    pub gestational_age_weeks: Option<u32>,
    pub baby_weight_kg: Option<f64>,
    pub birth_outcome: String,
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpticalExamInput {
    pub patient_id: String,
    pub visual_acuity_od_distance: String,
    pub visual_acuity_os_distance: String,
    pub visual_acuity_od_near: String,
    pub visual_acuity_os_near: String,
    pub prescription_od: EyePrescription,
    pub prescription_os: EyePrescription,
    pub pd_distance: Option<f64>,
    /// `YYYY-MM-DD`, blank for none
    pub next_visit_date: String,
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpticalItemInput {
    pub item_name: String,
    pub item_type: String,
    pub brand: String,
    pub stock_quantity: u32,
    pub unit_price_cents: i64,
}

fn check_positive(errors: &mut ValidationErrors, field: &str, value: Option<f64>) {
    if let Some(v) = value {
        if v.is_nan() || v <= 0.0 {
            errors.push(field, "must be positive");
        }
    }
}

fn check_axis(errors: &mut ValidationErrors, field: &str, rx: &EyePrescription) {
    rules::check_range(errors, field, rx.axis, 0, 180);
}

pub struct SpecialtyService<'a> {
    db: &'a Database,
}

impl<'a> SpecialtyService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn record_antenatal_visit(
        &self,
        input: &AntenatalVisitInput,
        session: &Session,
    ) -> ServiceResult<MaternityRecord> {
        let mut errors = ValidationErrors::new();
        rules::check_range(
            &mut errors,
            "gestational_age_weeks",
            input.gestational_age_weeks,
            0,
            MAX_GESTATIONAL_WEEKS,
        );
        check_positive(&mut errors, "weight_kg", input.weight_kg);
        check_positive(&mut errors, "fundal_height_cm", input.fundal_height_cm);
        errors.finish(())?;

        require_patient(self.db, &input.patient_id)?;

        let record = MaternityRecord {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id: input.patient_id.clone(),
            doctor_id: Some(session.user_id.clone()),
            visit_type: MaternityVisitType::Antenatal,
            gestational_age_weeks: input.gestational_age_weeks,
            weight_kg: input.weight_kg,
            blood_pressure: rules::optional_text(&input.blood_pressure),
            fetal_heart_rate: input.fetal_heart_rate,
            fundal_height_cm: input.fundal_height_cm,
            delivery_date: None,
            baby_weight_kg: None,
            birth_outcome: None,
            notes: rules::optional_text(&input.notes),
            created_at: now_timestamp(),
        };
        self.db.insert_maternity_record(&record)?;
        info!("Antenatal visit recorded for patient {}", record.patient_id);
        Ok(record)
    }

    pub fn record_delivery(&self, input: &DeliveryInput, session: &Session) -> ServiceResult<MaternityRecord> {
        let mut errors = ValidationErrors::new();
        let delivery_date = if input.delivery_date.trim().is_empty() {
            errors.push("delivery_date", "is required");
            None
        } else {
            rules::date(&mut errors, "delivery_date", &input.delivery_date)
        };
        rules::check_range(
            &mut errors,
            "gestational_age_weeks",
            input.gestational_age_weeks,
            0,
            MAX_GESTATIONAL_WEEKS,
        );
        check_positive(&mut errors, "baby_weight_kg", input.baby_weight_kg);
        let Some(delivery_date) = delivery_date else {
            return Err(errors.into());
        };
        errors.finish(())?;

        require_patient(self.db, &input.patient_id)?;

        let record = MaternityRecord {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id: input.patient_id.clone(),
            doctor_id: Some(session.user_id.clone()),
            visit_type: MaternityVisitType::Delivery,
            gestational_age_weeks: input.gestational_age_weeks,
            weight_kg: None,
            blood_pressure: None,
            fetal_heart_rate: None,
            fundal_height_cm: None,
            delivery_date: Some(delivery_date.format("%Y-%m-%d").to_string()),
            baby_weight_kg: input.baby_weight_kg,
            birth_outcome: rules::optional_text(&input.birth_outcome),
            notes: rules::optional_text(&input.notes),
            created_at: now_timestamp(),
        };
        self.db.insert_maternity_record(&record)?;
        info!("Delivery recorded for patient {}", record.patient_id);
        Ok(record)
    }

    pub fn list_maternity_records_for_patient(&self, patient_id: &str) -> ServiceResult<Vec<MaternityRecord>> {
        Ok(self.db.list_maternity_records(patient_id)?)
    }

    pub fn record_optical_exam(&self, input: &OpticalExamInput, session: &Session) -> ServiceResult<OpticalRecord> {
        let mut errors = ValidationErrors::new();
        check_axis(&mut errors, "prescription_od.axis", &input.prescription_od);
        check_axis(&mut errors, "prescription_os.axis", &input.prescription_os);
        check_positive(&mut errors, "pd_distance", input.pd_distance);
        let next_visit = rules::optional_date(&mut errors, "next_visit_date", &input.next_visit_date);
        errors.finish(())?;

        require_patient(self.db, &input.patient_id)?;

        let record = OpticalRecord {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id: input.patient_id.clone(),
            doctor_id: Some(session.user_id.clone()),
            visual_acuity_od_distance: rules::optional_text(&input.visual_acuity_od_distance),
            visual_acuity_os_distance: rules::optional_text(&input.visual_acuity_os_distance),
            visual_acuity_od_near: rules::optional_text(&input.visual_acuity_od_near),
            visual_acuity_os_near: rules::optional_text(&input.visual_acuity_os_near),
            prescription_od: input.prescription_od.clone(),
            prescription_os: input.prescription_os.clone(),
            pd_distance: input.pd_distance,
            next_visit_date: next_visit.map(|d| d.format("%Y-%m-%d").to_string()),
            notes: rules::optional_text(&input.notes),
            created_at: now_timestamp(),
        };
        self.db.insert_optical_record(&record)?;
        info!("Optical exam recorded for patient {}", record.patient_id);
        Ok(record)
    }

    pub fn list_optical_records_for_patient(&self, patient_id: &str) -> ServiceResult<Vec<OpticalRecord>> {
        Ok(self.db.list_optical_records(patient_id)?)
    }

    /// Add a stock line to the optical shop.
    pub fn add_optical_item(&self, input: &OpticalItemInput) -> ServiceResult<OpticalInventoryItem> {
        let mut errors = ValidationErrors::new();
        let item_name = rules::required_text(&mut errors, "item_name", &input.item_name, 2);
        let item_type = rules::required_text(&mut errors, "item_type", &input.item_type, 1);
        if input.unit_price_cents < 0 {
            errors.push("unit_price_cents", "cannot be negative");
        }
        let (Some(item_name), Some(item_type)) = (item_name, item_type) else {
            return Err(errors.into());
        };
        errors.finish(())?;

        let stamp = now_timestamp();
        let item = OpticalInventoryItem {
            id: uuid::Uuid::new_v4().to_string(),
            item_name,
            item_type: item_type.to_lowercase(),
            brand: rules::optional_text(&input.brand),
            stock_quantity: input.stock_quantity,
            unit_price_cents: input.unit_price_cents,
            created_at: stamp.clone(),
            updated_at: stamp,
        };
        self.db.insert_optical_item(&item)?;
        info!("Added optical item {} ({} in stock)", item.item_name, item.stock_quantity);
        Ok(item)
    }

    pub fn get_optical_item(&self, id: &str) -> ServiceResult<OpticalInventoryItem> {
        self.db
            .get_optical_item(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("Optical item {}", id)))
    }

    /// Optical shop stock, newest line first.
    pub fn list_optical_inventory(&self) -> ServiceResult<Vec<OpticalInventoryItem>> {
        Ok(self.db.list_optical_inventory()?)
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
        let doctor = session_for(&db, "Daniel Mutua", StaffRole::Doctor);
        let patient = make_patient("PAT-2024-0001", "Grace Njeri", "2024-01-01T08:00:00.000000Z");
        db.insert_patient(&patient).unwrap();
        (db, doctor, patient.id)
    }

    #[test]
    fn test_antenatal_ranges() {
        let (db, doctor, patient_id) = setup();
        let service = SpecialtyService::new(&db);

        let visit = AntenatalVisitInput {
            patient_id: patient_id.clone(),
            gestational_age_weeks: Some(28),
            weight_kg: Some(68.5),
            blood_pressure: "118/76".into(),
            ..Default::default()
        };
        service.record_antenatal_visit(&visit, &doctor).unwrap();

        let bad = AntenatalVisitInput {
            gestational_age_weeks: Some(46),
            weight_kg: Some(0.0),
            ..visit
        };
        let err = service.record_antenatal_visit(&bad, &doctor).unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert!(errors.has_field("gestational_age_weeks"));
        assert!(errors.has_field("weight_kg"));

        let records = service.list_maternity_records_for_patient(&patient_id).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].visit_type, MaternityVisitType::Antenatal);
    }

    #[test]
    fn test_delivery_requires_date() {
        let (db, doctor, patient_id) = setup();
        let service = SpecialtyService::new(&db);

        let input = DeliveryInput {
            patient_id,
            baby_weight_kg: Some(3.2),
            birth_outcome: "live birth".into(),
            ..Default::default()
        };
        let err = service.record_delivery(&input, &doctor).unwrap_err();
        assert!(err.validation_errors().unwrap().has_field("delivery_date"));

        let input = DeliveryInput {
            delivery_date: "2024-05-30".into(),
            ..input
        };
        let record = service.record_delivery(&input, &doctor).unwrap();
        assert_eq!(record.delivery_date.as_deref(), Some("2024-05-30"));
    }

    #[test]
    fn test_optical_exam() {
        let (db, doctor, patient_id) = setup();
        let service = SpecialtyService::new(&db);

        let input = OpticalExamInput {
            patient_id: patient_id.clone(),
            visual_acuity_od_distance: "6/9".into(),
            prescription_od: EyePrescription {
                sphere: Some(-1.25),
                cylinder: Some(-0.5),
                axis: Some(180),
                add: None,
            },
            pd_distance: Some(63.0),
            ..Default::default()
        };
        let record = service.record_optical_exam(&input, &doctor).unwrap();
        assert_eq!(service.list_optical_records_for_patient(&patient_id).unwrap(), vec![record]);

        let bad = OpticalExamInput {
            prescription_os: EyePrescription {
                axis: Some(181),
                ..Default::default()
            },
            ..input
        };
        assert!(service.record_optical_exam(&bad, &doctor).is_err());

        let missing = OpticalExamInput {
            patient_id: "nobody".into(),
            ..Default::default()
        };
        assert!(matches!(
            service.record_optical_exam(&missing, &doctor),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn test_optical_inventory() {
        let db = Database::open_in_memory().unwrap();
        let service = SpecialtyService::new(&db);

        let frame = service
            .add_optical_item(&OpticalItemInput {
                item_name: "Half-rim frame".into(),
                item_type: "Frame".into(),
                brand: "Lumen".into(),
                stock_quantity: 8,
                unit_price_cents: 450_000,
            })
            .unwrap();
        let lens = service
            .add_optical_item(&OpticalItemInput {
                item_name: "Single vision lens".into(),
                item_type: "lens".into(),
                stock_quantity: 40,
                unit_price_cents: 120_000,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(frame.item_type, "frame");
        assert_eq!(lens.brand, None);
        assert_eq!(service.get_optical_item(&frame.id).unwrap(), frame);

        let listed = service.list_optical_inventory().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, lens.id);

        let err = service
            .add_optical_item(&OpticalItemInput {
                item_name: "x".into(),
                unit_price_cents: -1,
                ..Default::default()
            })
            .unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert!(errors.has_field("item_name"));
        assert!(errors.has_field("item_type"));
        assert!(errors.has_field("unit_price_cents"));
        assert!(matches!(
            service.get_optical_item("missing"),
            Err(ServiceError::NotFound(_))
        ));
    }
}
