//! Patient registration form.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{rules, ValidationErrors, ValidationRules};
use crate::models::{age_on, BloodGroup, InsuranceStatus, PatientType, Sex};

/// Oldest age accepted on a form.
pub const MAX_AGE_YEARS: u32 = 150;

/// Raw registration input. Every field is the string the user typed; blank
/// means not supplied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientForm {
    pub full_name: String,
    /// `YYYY-MM-DD`
    pub date_of_birth: String,
    pub age: String,
    pub sex: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub blood_group: String,
    /// Comma-separated
    pub allergies: String,
    pub insurance_company: String,
    pub insurance_number: String,
    /// Blank applies the default rule (active if a company is given, else none)
    pub insurance_status: String,
    /// Blank means outpatient
    pub patient_type: String,
}

/// A registration form that passed every rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPatient {
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    /// Explicit age if supplied, else derived from the date of birth
    pub age: u32,
    pub sex: Option<Sex>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub blood_group: Option<BloodGroup>,
    pub allergies: Vec<String>,
    pub insurance_company: Option<String>,
    pub insurance_number: Option<String>,
    pub insurance_status: InsuranceStatus,
    pub patient_type: PatientType,
}

/// Default insurance status for a fresh registration.
pub fn default_insurance_status(insurance_company: Option<&str>) -> InsuranceStatus {
    match insurance_company {
        Some(c) if !c.trim().is_empty() => InsuranceStatus::Active,
        _ => InsuranceStatus::None,
    }
}

/// Split a comma-separated allergy list, dropping blanks and duplicates.
pub fn parse_allergies(value: &str) -> Vec<String> {
    let mut allergies: Vec<String> = Vec::new();
    for item in value.split(',').filter_map(rules::optional_text) {
        if !allergies.iter().any(|a| a.eq_ignore_ascii_case(&item)) {
            allergies.push(item);
        }
    }
    allergies
}

/// Validate a registration form as of `today`.
pub fn validate_patient_form(
    form: &PatientForm,
    today: NaiveDate,
    limits: &ValidationRules,
) -> Result<ValidatedPatient, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let full_name = rules::required_text(&mut errors, "full_name", &form.full_name, 2);

    let date_of_birth = if form.date_of_birth.trim().is_empty() {
        errors.push("date_of_birth", "is required");
        None
    } else {
        rules::date(&mut errors, "date_of_birth", &form.date_of_birth)
    };
    let date_of_birth = date_of_birth.filter(|dob| {
        if *dob > today {
            errors.push("date_of_birth", "cannot be in the future");
            false
        } else {
            true
        }
    });

    let explicit_age = rules::optional_int_in_range(&mut errors, "age", &form.age, 0, MAX_AGE_YEARS);
    if let Some(dob) = date_of_birth {
        if age_on(dob, today) > MAX_AGE_YEARS {
            errors.push("date_of_birth", format!("implies an age over {}", MAX_AGE_YEARS));
        }
    }

    let sex = rules::optional_enum(&mut errors, "sex", &form.sex);
    let phone = rules::optional_phone(&mut errors, "phone", &form.phone, limits.min_phone_digits);
    let email = rules::optional_email(&mut errors, "email", &form.email);
    let blood_group = rules::optional_enum(&mut errors, "blood_group", &form.blood_group);
    let explicit_insurance =
        rules::optional_enum(&mut errors, "insurance_status", &form.insurance_status);
    let patient_type = rules::optional_enum(&mut errors, "patient_type", &form.patient_type);

    let (Some(full_name), Some(date_of_birth)) = (full_name, date_of_birth) else {
        return Err(errors);
    };

    let insurance_company = rules::optional_text(&form.insurance_company);
    let insurance_status = explicit_insurance
        .unwrap_or_else(|| default_insurance_status(insurance_company.as_deref()));

    errors.finish(ValidatedPatient {
        full_name,
        date_of_birth,
        age: explicit_age.unwrap_or_else(|| age_on(date_of_birth, today)),
        sex,
        phone,
        email,
        address: rules::optional_text(&form.address),
        city: rules::optional_text(&form.city),
        blood_group,
        allergies: parse_allergies(&form.allergies),
        insurance_company,
        insurance_number: rules::optional_text(&form.insurance_number),
        insurance_status,
        patient_type: patient_type.unwrap_or(PatientType::Outpatient),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn valid_form() -> PatientForm {
        PatientForm {
            full_name: "Grace Njeri".into(),
            date_of_birth: "2000-01-01".into(),
            phone: "0712345678".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_minimal_form() {
        let v = validate_patient_form(&valid_form(), today(), &ValidationRules::default()).unwrap();
        assert_eq!(v.full_name, "Grace Njeri");
        assert_eq!(v.age, 24);
        assert_eq!(v.insurance_status, InsuranceStatus::None);
        assert_eq!(v.patient_type, PatientType::Outpatient);
        assert_eq!(v.phone.as_deref(), Some("0712345678"));
    }

    #[test]
    fn test_reports_every_bad_field() {
        let form = PatientForm {
            full_name: "G".into(),
            date_of_birth: "2000-13-01".into(),
            sex: "F".into(),
            phone: "12345".into(),
            insurance_status: "lapsed".into(),
            ..Default::default()
        };
        let errors = validate_patient_form(&form, today(), &ValidationRules::default()).unwrap_err();
        for field in ["full_name", "date_of_birth", "sex", "phone", "insurance_status"] {
            assert!(errors.has_field(field), "expected error on {}", field);
        }
    }

    #[test]
    fn test_missing_date_of_birth() {
        let form = PatientForm {
            date_of_birth: "".into(),
            ..valid_form()
        };
        let errors = validate_patient_form(&form, today(), &ValidationRules::default()).unwrap_err();
        assert_eq!(errors.field("date_of_birth").unwrap().message, "is required");
    }

    #[test]
    fn test_future_date_of_birth() {
        let form = PatientForm {
            date_of_birth: "2024-06-02".into(),
            ..valid_form()
        };
        assert!(validate_patient_form(&form, today(), &ValidationRules::default()).is_err());
    }

    #[test]
    fn test_insurance_company_activates_cover() {
        let form = PatientForm {
            insurance_company: "NHIF".into(),
            ..valid_form()
        };
        let v = validate_patient_form(&form, today(), &ValidationRules::default()).unwrap();
        assert_eq!(v.insurance_status, InsuranceStatus::Active);

        let form = PatientForm {
            insurance_company: "NHIF".into(),
            insurance_status: "expired".into(),
            ..valid_form()
        };
        let v = validate_patient_form(&form, today(), &ValidationRules::default()).unwrap();
        assert_eq!(v.insurance_status, InsuranceStatus::Expired);
    }

    #[test]
    fn test_explicit_age_wins() {
        let form = PatientForm {
            age: "30".into(),
            ..valid_form()
        };
        let v = validate_patient_form(&form, today(), &ValidationRules::default()).unwrap();
        assert_eq!(v.age, 30);
    }

    #[test]
    fn test_phone_threshold_configurable() {
        let form = PatientForm {
            phone: "712345678".into(),
            ..valid_form()
        };
        assert!(validate_patient_form(&form, today(), &ValidationRules { min_phone_digits: 9 }).is_ok());
        assert!(validate_patient_form(&form, today(), &ValidationRules { min_phone_digits: 10 }).is_err());
    }

    #[test]
    fn test_parse_allergies() {
        assert_eq!(
            parse_allergies(" Penicillin, latex,, penicillin , "),
            vec!["Penicillin", "latex"]
        );
        assert!(parse_allergies("").is_empty());
    }
}
