//! End-to-end visit workflow: registration through discharge and billing.

use hospital_records_core::models::{
    AdmissionStatus, PatientType, PaymentMethod, PaymentStatus, StaffProfile, StaffRole, TestStatus,
    VisitStatus,
};
use hospital_records_core::service::{
    AdmissionInput, AntenatalVisitInput, BillInput, BillItemInput, BillingService, ClinicalService,
    ConsultationInput, ConsultationOutcome, DischargeOutcome, LabTestInput, MedicationInput,
    PharmacyService, SaleInput, SpecialtyService, WardInput, WardService,
};
use hospital_records_core::{
    AppointmentForm, AppointmentService, Database, PatientForm, PatientService, ServiceConfig,
    ServiceError, Session, SessionManager,
};

struct Staff {
    receptionist: Session,
    doctor: Session,
    nurse: Session,
    cashier: Session,
    pharmacist: Session,
}

fn staff(db: &Database) -> Staff {
    let manager = SessionManager::new(db);
    let sign_up = |name: &str, email: &str, role: StaffRole| {
        db.insert_profile(&StaffProfile::new(name.to_string(), email.to_string(), role))
            .unwrap();
        manager.sign_in(email).unwrap()
    };
    Staff {
        receptionist: sign_up("Rose Achieng", "rose@hospital.test", StaffRole::Receptionist),
        doctor: sign_up("Daniel Mutua", "daniel@hospital.test", StaffRole::Doctor),
        nurse: sign_up("Faith Chebet", "faith@hospital.test", StaffRole::Nurse),
        cashier: sign_up("Ann Wambui", "ann@hospital.test", StaffRole::Cashier),
        pharmacist: sign_up("Mercy Atieno", "mercy@hospital.test", StaffRole::Pharmacist),
    }
}

fn register(db: &Database, config: &ServiceConfig, session: &Session, name: &str) -> String {
    let form = PatientForm {
        full_name: name.to_string(),
        date_of_birth: "1992-04-18".to_string(),
        sex: "Female".to_string(),
        phone: "0722 111 222".to_string(),
        ..Default::default()
    };
    PatientService::new(db, config)
        .create_patient(&form, session)
        .unwrap()
        .id
}

#[test]
fn test_outpatient_visit() {
    let _ = env_logger::builder().is_test(true).try_init();
    let db = Database::open_in_memory().unwrap();
    let config = ServiceConfig::default();
    let staff = staff(&db);
    let patient_id = register(&db, &config, &staff.receptionist, "Grace Njeri");

    // Appointment
    let appointments = AppointmentService::new(&db);
    let appointment = appointments
        .schedule_appointment(
            &AppointmentForm {
                patient_id: patient_id.clone(),
                doctor_id: staff.doctor.user_id.clone(),
                appointment_date: "2024-07-15".to_string(),
                appointment_time: "10:00".to_string(),
                reason: "Recurring headaches".to_string(),
                notes: String::new(),
            },
            &staff.receptionist,
        )
        .unwrap();
    assert_eq!(appointment.status, VisitStatus::Pending);
    appointments
        .update_appointment_status(&appointment.id, VisitStatus::InProgress)
        .unwrap();

    // Consultation and lab
    let clinical = ClinicalService::new(&db);
    let consultation = clinical
        .start_consultation(
            &ConsultationInput {
                patient_id: patient_id.clone(),
                appointment_id: Some(appointment.id.clone()),
                chief_complaint: "Headache for two weeks".to_string(),
                ..Default::default()
            },
            &staff.doctor,
        )
        .unwrap();
    let lab = clinical
        .request_lab_test(
            &LabTestInput {
                patient_id: patient_id.clone(),
                consultation_id: Some(consultation.id.clone()),
                test_name: "Malaria RDT".to_string(),
                test_type: "parasitology".to_string(),
                notes: String::new(),
            },
            &staff.doctor,
        )
        .unwrap();
    clinical.update_lab_status(&lab.id, TestStatus::Paid).unwrap();
    clinical
        .record_lab_results(&lab.id, "Negative", &staff.nurse)
        .unwrap();
    assert_eq!(clinical.list_lab_requests(TestStatus::Completed).unwrap().len(), 1);

    clinical
        .complete_consultation(
            &consultation.id,
            &ConsultationOutcome {
                confirmatory_diagnosis: "Tension headache".to_string(),
                treatment_plan: "Analgesics".to_string(),
                follow_up_date: String::new(),
            },
            &staff.doctor,
        )
        .unwrap();
    appointments
        .update_appointment_status(&appointment.id, VisitStatus::Completed)
        .unwrap();
    let reopened = appointments.update_appointment_status(&appointment.id, VisitStatus::Cancelled);
    assert!(matches!(reopened, Err(ServiceError::InvalidTransition { .. })));

    // Pharmacy
    let pharmacy = PharmacyService::new(&db);
    let med = pharmacy
        .add_medication(&MedicationInput {
            name: "Paracetamol 500mg".to_string(),
            quantity_in_stock: 100,
            minimum_stock_level: 20,
            unit_price_cents: 500,
            ..Default::default()
        })
        .unwrap();
    let sale = pharmacy
        .record_sale(
            &SaleInput {
                medication_id: med.id.clone(),
                patient_id: Some(patient_id.clone()),
                quantity: 12,
                payment_method: Some(PaymentMethod::Cash),
            },
            &staff.pharmacist,
        )
        .unwrap();
    assert_eq!(pharmacy.get_medication(&med.id).unwrap().quantity_in_stock, 88);

    // Billing
    let billing = BillingService::new(&db, &config);
    let (bill, items) = billing
        .create_bill(
            &BillInput {
                patient_id: patient_id.clone(),
                consultation_id: Some(consultation.id.clone()),
                admission_id: None,
                items: vec![
                    BillItemInput {
                        item_name: "Consultation".to_string(),
                        item_type: "consultation".to_string(),
                        quantity: 1,
                        unit_price_cents: 100_000,
                    },
                    BillItemInput {
                        item_name: "Malaria RDT".to_string(),
                        item_type: "lab".to_string(),
                        quantity: 1,
                        unit_price_cents: 30_000,
                    },
                    BillItemInput {
                        item_name: "Paracetamol 500mg".to_string(),
                        item_type: "medication".to_string(),
                        quantity: sale.quantity,
                        unit_price_cents: sale.unit_price_cents,
                    },
                ],
                discount_cents: 6_000,
            },
            &staff.cashier,
        )
        .unwrap();
    let item_sum: i64 = items.iter().map(|i| i.total_price_cents).sum();
    assert_eq!(bill.total_amount_cents, item_sum - 6_000);
    assert_eq!(bill.total_amount_cents, 130_000);

    let bill = billing
        .record_payment(&bill.id, 30_000, Some(PaymentMethod::Insurance))
        .unwrap();
    assert_eq!(bill.payment_status, PaymentStatus::Partial);
    let bill = billing.record_payment(&bill.id, 100_000, None).unwrap();
    assert_eq!(bill.payment_status, PaymentStatus::Paid);
    assert_eq!(billing.list_bills_for_patient(&patient_id).unwrap().len(), 1);
}

#[test]
fn test_inpatient_stay() {
    let db = Database::open_in_memory().unwrap();
    let config = ServiceConfig::default();
    let staff = staff(&db);
    let patient_id = register(&db, &config, &staff.receptionist, "Mary Wanjiku");

    let wards = WardService::new(&db);
    let ward = wards
        .create_ward(&WardInput {
            name: "Maternity".to_string(),
            ward_type: "maternity".to_string(),
            total_beds: 4,
        })
        .unwrap();

    let admission = wards
        .admit_patient(
            &AdmissionInput {
                patient_id: patient_id.clone(),
                ward_id: Some(ward.id.clone()),
                bed_number: "M-2".to_string(),
                admission_reason: "Labour".to_string(),
                ..Default::default()
            },
            &staff.nurse,
        )
        .unwrap();
    assert_eq!(wards.get_ward(&ward.id).unwrap().available_beds, 3);

    let patients = PatientService::new(&db, &config);
    assert_eq!(patients.get_patient(&patient_id).unwrap().patient_type, PatientType::Inpatient);

    let specialty = SpecialtyService::new(&db);
    specialty
        .record_antenatal_visit(
            &AntenatalVisitInput {
                patient_id: patient_id.clone(),
                gestational_age_weeks: Some(39),
                fetal_heart_rate: Some(140),
                ..Default::default()
            },
            &staff.doctor,
        )
        .unwrap();

    let discharged = wards
        .discharge_patient(
            &admission.id,
            &DischargeOutcome {
                status: AdmissionStatus::Discharged,
                reason: "Delivered, mother and baby well".to_string(),
            },
            &staff.doctor,
        )
        .unwrap();
    assert_eq!(discharged.discharged_by.as_deref(), Some(staff.doctor.user_id.as_str()));
    assert_eq!(wards.get_ward(&ward.id).unwrap().available_beds, 4);
    assert_eq!(patients.get_patient(&patient_id).unwrap().patient_type, PatientType::Outpatient);
    assert!(wards.list_active_admissions().unwrap().is_empty());
}

#[test]
fn test_signed_out_session_is_rejected() {
    let db = Database::open_in_memory().unwrap();
    let staff = staff(&db);
    let manager = SessionManager::new(&db);

    manager.sign_out(&staff.cashier).unwrap();
    let result = manager.require_session(&staff.cashier.token);
    assert!(matches!(result, Err(ServiceError::Unauthorized(_))));
    assert!(manager.require_session(&staff.doctor.token).is_ok());
}
