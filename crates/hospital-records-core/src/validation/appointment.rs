//! Appointment scheduling form.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{rules, ValidationErrors};

/// Raw scheduling input with date and time entered separately.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppointmentForm {
    pub patient_id: String,
    pub doctor_id: String,
    /// `YYYY-MM-DD`
    pub appointment_date: String,
    /// `HH:MM` or `HH:MM:SS`
    pub appointment_time: String,
    pub reason: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedAppointment {
    pub patient_id: String,
    pub doctor_id: String,
    pub scheduled_at: NaiveDateTime,
    pub reason: String,
    pub notes: Option<String>,
}

/// Validate a scheduling form, combining date and time into one timestamp.
pub fn validate_appointment_form(form: &AppointmentForm) -> Result<ValidatedAppointment, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let patient_id = rules::required_text(&mut errors, "patient_id", &form.patient_id, 1);
    let doctor_id = rules::required_text(&mut errors, "doctor_id", &form.doctor_id, 1);

    let date = if form.appointment_date.trim().is_empty() {
        errors.push("appointment_date", "is required");
        None
    } else {
        rules::date(&mut errors, "appointment_date", &form.appointment_date)
    };
    let time = if form.appointment_time.trim().is_empty() {
        errors.push("appointment_time", "is required");
        None
    } else {
        rules::time(&mut errors, "appointment_time", &form.appointment_time)
    };

    let reason = rules::required_text(&mut errors, "reason", &form.reason, 5);

    match (patient_id, doctor_id, date, time, reason) {
        (Some(patient_id), Some(doctor_id), Some(date), Some(time), Some(reason)) => {
            errors.finish(ValidatedAppointment {
                patient_id,
                doctor_id,
                scheduled_at: date.and_time(time),
                reason,
                notes: rules::optional_text(&form.notes),
            })
        }
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> AppointmentForm {
        AppointmentForm {
            patient_id: "patient-1".into(),
            doctor_id: "doctor-1".into(),
            appointment_date: "2024-07-15".into(),
            appointment_time: "14:30".into(),
            reason: "Follow-up on blood pressure".into(),
            notes: "".into(),
        }
    }

    #[test]
    fn test_combines_date_and_time() {
        let v = validate_appointment_form(&valid_form()).unwrap();
        assert_eq!(v.scheduled_at.to_string(), "2024-07-15 14:30:00");
        assert_eq!(v.notes, None);
    }

    #[test]
    fn test_missing_time() {
        let form = AppointmentForm {
            appointment_time: " ".into(),
            ..valid_form()
        };
        let errors = validate_appointment_form(&form).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.has_field("appointment_time"));
    }

    #[test]
    fn test_unparsable_date_and_short_reason() {
        let form = AppointmentForm {
            appointment_date: "next tuesday".into(),
            reason: "ache".into(),
            ..valid_form()
        };
        let errors = validate_appointment_form(&form).unwrap_err();
        assert!(errors.has_field("appointment_date"));
        assert!(errors.has_field("reason"));
    }
}
