use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::{AppState, Directory};
use shared_utils::ClinicCalendar;

use crate::models::{AppointmentError, CheckInResult};

/// Queue number shown to the patient, e.g. `Q007`. Widens past 999.
pub fn format_queue_number(sequence: u32) -> String {
    format!("Q{:03}", sequence)
}

/// Front-desk check-in with same-day queue numbering.
pub struct CheckInService {
    directory: Arc<dyn Directory>,
    calendar: ClinicCalendar,
}

impl CheckInService {
    pub fn new(state: &AppState) -> Self {
        Self::with_directory(state.directory.clone(), ClinicCalendar::from_config(&state.config))
    }

    pub fn with_directory(directory: Arc<dyn Directory>, calendar: ClinicCalendar) -> Self {
        Self { directory, calendar }
    }

    pub async fn check_in(&self, appointment_id: Uuid) -> Result<CheckInResult, AppointmentError> {
        self.check_in_at(appointment_id, Utc::now()).await
    }

    pub async fn check_in_at(
        &self,
        appointment_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<CheckInResult, AppointmentError> {
        debug!("Checking in appointment {}", appointment_id);

        let appointment = self
            .directory
            .get_appointment(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        if appointment.checked_in {
            warn!("Appointment {} is already checked in", appointment_id);
            return Err(AppointmentError::AlreadyCheckedIn);
        }

        let today = self.calendar.today(now);
        if appointment.appointment_date < today {
            warn!(
                "Refusing check-in of appointment {} dated {} (today is {})",
                appointment_id, appointment.appointment_date, today
            );
            return Err(AppointmentError::PastAppointment);
        }

        let (day_start, day_end) = self.calendar.day_window(today);
        let sequence = self
            .directory
            .reserve_queue_number(today, day_start, day_end)
            .await?;
        let queue_number = format_queue_number(sequence);

        // The reserved number is dropped if another request checked this appointment in first
        let updated = self
            .directory
            .mark_checked_in(appointment_id, now, &queue_number)
            .await?
            .ok_or_else(|| {
                warn!("Appointment {} was checked in concurrently", appointment_id);
                AppointmentError::AlreadyCheckedIn
            })?;

        info!("Checked in appointment {} as {}", appointment_id, queue_number);

        Ok(CheckInResult {
            queue_number,
            appointment: updated,
        })
    }
}
