use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use shared_database::{AppState, Directory};
use shared_models::{AppointmentFilter, AppointmentStatus};
use shared_utils::ClinicCalendar;

use crate::models::{AppointmentError, DashboardStats, StatusCount};
use crate::services::sweeper::MissedAppointmentSweeper;

/// Admin dashboard. Every load sweeps missed appointments before counting.
pub struct DashboardService {
    directory: Arc<dyn Directory>,
    calendar: ClinicCalendar,
    sweeper: MissedAppointmentSweeper,
}

impl DashboardService {
    pub fn new(state: &AppState) -> Self {
        Self::with_directory(state.directory.clone(), ClinicCalendar::from_config(&state.config))
    }

    pub fn with_directory(directory: Arc<dyn Directory>, calendar: ClinicCalendar) -> Self {
        Self {
            sweeper: MissedAppointmentSweeper::with_directory(directory.clone(), calendar),
            directory,
            calendar,
        }
    }

    pub async fn get_dashboard(&self) -> Result<DashboardStats, AppointmentError> {
        self.get_dashboard_at(Utc::now()).await
    }

    pub async fn get_dashboard_at(&self, now: DateTime<Utc>) -> Result<DashboardStats, AppointmentError> {
        let swept = self.sweeper.sweep_at(now).await?;
        let today = self.calendar.today(now);

        let total_appointments = self.count(AppointmentFilter::default()).await?;

        let mut by_status = Vec::with_capacity(AppointmentStatus::ALL.len());
        for status in AppointmentStatus::ALL {
            let count = self
                .count(AppointmentFilter {
                    status: Some(status),
                    ..Default::default()
                })
                .await?;
            by_status.push(StatusCount { status, count });
        }

        let todays_appointments = self
            .count(AppointmentFilter {
                date_from: Some(today),
                date_to: Some(today),
                ..Default::default()
            })
            .await?;

        let (day_start, day_end) = self.calendar.day_window(today);
        let checked_in_today = self.directory.count_checked_in_between(day_start, day_end).await?;

        let mut upcoming_appointments = 0;
        if let Some(tomorrow) = today.succ_opt() {
            for status in AppointmentStatus::SWEEPABLE {
                upcoming_appointments += self
                    .count(AppointmentFilter {
                        status: Some(status),
                        date_from: Some(tomorrow),
                        ..Default::default()
                    })
                    .await?;
            }
        }

        let doctors_on_duty = self.directory.list_doctors_on_duty().await?.len() as u64;

        debug!("Dashboard for {}: {} appointments, {} swept", today, total_appointments, swept.missed_count);

        Ok(DashboardStats {
            date: today,
            total_appointments,
            by_status,
            todays_appointments,
            checked_in_today,
            upcoming_appointments,
            doctors_on_duty,
            missed_swept: swept.missed_count,
        })
    }

    async fn count(&self, filter: AppointmentFilter) -> Result<u64, AppointmentError> {
        Ok(self.directory.count_appointments(&filter).await?)
    }
}
