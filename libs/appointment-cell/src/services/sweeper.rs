use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::{AppState, Directory};
use shared_models::Appointment;
use shared_utils::ClinicCalendar;

use crate::models::{AppointmentError, SweepResult};

/// Reclassifies SCHEDULED / CONFIRMED appointments whose start has passed
/// without a check-in as MISSED.
pub struct MissedAppointmentSweeper {
    directory: Arc<dyn Directory>,
    calendar: ClinicCalendar,
}

impl MissedAppointmentSweeper {
    pub fn new(state: &AppState) -> Self {
        Self::with_directory(state.directory.clone(), ClinicCalendar::from_config(&state.config))
    }

    pub fn with_directory(directory: Arc<dyn Directory>, calendar: ClinicCalendar) -> Self {
        Self { directory, calendar }
    }

    pub async fn sweep(&self) -> Result<SweepResult, AppointmentError> {
        self.sweep_at(Utc::now()).await
    }

    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<SweepResult, AppointmentError> {
        let today = self.calendar.today(now);
        let candidates = self.directory.find_sweep_candidates(today).await?;

        let overdue: Vec<Uuid> = candidates
            .iter()
            .filter(|a| self.is_overdue(a, now))
            .map(|a| a.id)
            .collect();

        if overdue.is_empty() {
            debug!("No missed appointments as of {}", now);
            return Ok(SweepResult { missed_count: 0 });
        }

        let missed_count = self.directory.mark_missed(&overdue).await?;
        info!("Swept {} appointments to MISSED", missed_count);

        Ok(SweepResult { missed_count })
    }

    fn is_overdue(&self, appointment: &Appointment, now: DateTime<Utc>) -> bool {
        !appointment.checked_in
            && appointment.status.is_sweepable()
            && self
                .calendar
                .local_instant(appointment.appointment_date, appointment.appointment_time)
                < now
    }
}
