use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use futures::future::try_join_all;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::{AppState, Directory};
use shared_models::{AppointmentStatus, Doctor};
use shared_utils::ClinicCalendar;

use crate::models::{AvailableSlots, DoctorError, DoctorSchedule, ScheduleDoctor, ScheduleStats};
use crate::services::slots::{total_slots, TimeRange, SLOT_MINUTES};

/// Read-only view of doctors' booked load for a day.
pub struct DoctorScheduleService {
    directory: Arc<dyn Directory>,
    calendar: ClinicCalendar,
}

impl DoctorScheduleService {
    pub fn new(state: &AppState) -> Self {
        Self::with_directory(state.directory.clone(), ClinicCalendar::from_config(&state.config))
    }

    pub fn with_directory(directory: Arc<dyn Directory>, calendar: ClinicCalendar) -> Self {
        Self { directory, calendar }
    }

    /// Schedules for `date`, or the clinic's current day when absent.
    pub async fn get_doctor_schedules(
        &self,
        date: Option<NaiveDate>,
    ) -> Result<Vec<DoctorSchedule>, DoctorError> {
        self.get_doctor_schedules_at(date, Utc::now()).await
    }

    pub async fn get_doctor_schedules_at(
        &self,
        date: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> Result<Vec<DoctorSchedule>, DoctorError> {
        let date = date.unwrap_or_else(|| self.calendar.today(now));
        debug!("Building doctor schedules for {}", date);

        let doctors = self.directory.list_doctors_on_duty().await?;
        let schedules = try_join_all(doctors.iter().map(|doctor| self.schedule_for(doctor, date))).await?;

        debug!("Built {} doctor schedules for {}", schedules.len(), date);
        Ok(schedules)
    }

    async fn schedule_for(&self, doctor: &Doctor, date: NaiveDate) -> Result<DoctorSchedule, DoctorError> {
        let appointments = self
            .directory
            .doctor_appointments_on(doctor.id, date, &AppointmentStatus::ACTIVE)
            .await?;

        let booked = u32::try_from(appointments.len()).unwrap_or(u32::MAX);
        let stats = ScheduleStats::new(total_slots(&doctor.working_hours), booked);

        Ok(DoctorSchedule {
            doctor: ScheduleDoctor::from(doctor),
            appointments,
            stats,
        })
    }

    /// Unbooked 30 minute slot starts for one doctor on `date`.
    pub async fn get_available_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<AvailableSlots, DoctorError> {
        let doctor = self
            .directory
            .get_doctor(doctor_id)
            .await?
            .ok_or(DoctorError::NotFound)?;

        let booked = self
            .directory
            .doctor_appointments_on(doctor.id, date, &AppointmentStatus::ACTIVE)
            .await?;

        let starts = match TimeRange::parse(&doctor.working_hours) {
            Some(range) => range.slot_starts(SLOT_MINUTES),
            None => {
                warn!(
                    "Doctor {} has unparseable working hours '{}', no slots listed",
                    doctor.id, doctor.working_hours
                );
                Vec::new()
            }
        };

        let slots = starts
            .into_iter()
            .filter(|start| !booked.iter().any(|a| a.appointment_time == *start))
            .map(|start| start.format("%H:%M").to_string())
            .collect();

        Ok(AvailableSlots {
            doctor_id: doctor.id,
            date,
            working_hours: doctor.working_hours,
            slot_minutes: SLOT_MINUTES,
            slots,
        })
    }
}
