//! Appointment scheduling.

use log::{debug, info};

use super::{require_patient, ServiceError, ServiceResult};
use crate::db::Database;
use crate::models::{now_timestamp, Appointment, Session, StaffRole, VisitStatus};
use crate::validation::{validate_appointment_form, AppointmentForm};

pub struct AppointmentService<'a> {
    db: &'a Database,
}

impl<'a> AppointmentService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Book an appointment. It starts out `pending`.
    pub fn schedule_appointment(&self, form: &AppointmentForm, session: &Session) -> ServiceResult<Appointment> {
        let validated = validate_appointment_form(form)?;

        require_patient(self.db, &validated.patient_id)?;
        let doctor = self
            .db
            .get_profile(&validated.doctor_id)?
            .ok_or_else(|| ServiceError::NotFound(format!("Doctor {}", validated.doctor_id)))?;
        if doctor.role != StaffRole::Doctor {
            return Err(ServiceError::Conflict(format!(
                "{} is a {}, not a doctor",
                doctor.full_name, doctor.role
            )));
        }

        let stamp = now_timestamp();
        let appointment = Appointment {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id: validated.patient_id,
            doctor_id: Some(doctor.id),
            appointment_date: validated.scheduled_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            reason: Some(validated.reason),
            notes: validated.notes,
            status: VisitStatus::Pending,
            created_by: Some(session.user_id.clone()),
            created_at: stamp.clone(),
            updated_at: stamp,
        };

        self.db.insert_appointment(&appointment)?;
        info!(
            "Scheduled appointment {} for patient {} at {}",
            appointment.id, appointment.patient_id, appointment.appointment_date
        );
        Ok(appointment)
    }

    /// Move an appointment to `status`.
    ///
    /// Completed and cancelled appointments are final. Re-applying the
    /// current status changes nothing.
    pub fn update_appointment_status(&self, id: &str, status: VisitStatus) -> ServiceResult<Appointment> {
        let mut appointment = self
            .db
            .get_appointment(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("Appointment {}", id)))?;

        if appointment.status == status {
            debug!("Appointment {} already {}", id, status);
            return Ok(appointment);
        }
        if !appointment.status.can_transition_to(status) {
            return Err(ServiceError::InvalidTransition {
                from: appointment.status.to_string(),
                to: status.to_string(),
            });
        }

        let stamp = now_timestamp();
        self.db.update_appointment_status(id, status, &stamp)?;
        info!("Appointment {} moved {} -> {}", id, appointment.status, status);

        appointment.status = status;
        appointment.updated_at = stamp;
        Ok(appointment)
    }

    /// All appointments, soonest first.
    pub fn list_appointments(&self) -> ServiceResult<Vec<Appointment>> {
        Ok(self.db.list_appointments()?)
    }

    pub fn list_appointments_for_patient(&self, patient_id: &str) -> ServiceResult<Vec<Appointment>> {
        Ok(self.db.list_appointments_for_patient(patient_id)?)
    }
}
