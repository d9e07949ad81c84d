use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use shared_models::{
    Appointment, AppointmentDetails, AppointmentFilter, AppointmentPatch, AppointmentStatus,
    Doctor, Page, PageRequest,
};

/// Persistent store of appointments, doctors and patients.
///
/// Every method is a single request against the store. Methods that must not
/// race with each other (`reserve_queue_number`, `mark_checked_in`,
/// `mark_missed`) are atomic on the store side.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>>;

    /// Filtered page ordered by date then time, newest first.
    async fn list_appointments(
        &self,
        filter: &AppointmentFilter,
        page: PageRequest,
    ) -> Result<Page<AppointmentDetails>>;

    async fn count_appointments(&self, filter: &AppointmentFilter) -> Result<u64>;

    /// Appointments with `checked_in = true` and `checked_in_at` in `[from, until)`.
    async fn count_checked_in_between(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<u64>;

    /// Atomically hands out the next queue sequence for `day`.
    ///
    /// The first reservation of a day is seeded with the number of check-ins
    /// already recorded in `[window_start, window_end)`, so the sequence
    /// continues from the derived daily count.
    async fn reserve_queue_number(
        &self,
        day: NaiveDate,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<u32>;

    /// Sets the check-in fields and status CHECKED_IN, only if the appointment
    /// is not checked in yet. Returns `None` when no row satisfied the guard.
    async fn mark_checked_in(
        &self,
        id: Uuid,
        checked_in_at: DateTime<Utc>,
        queue_number: &str,
    ) -> Result<Option<Appointment>>;

    async fn update_appointment(
        &self,
        id: Uuid,
        patch: &AppointmentPatch,
    ) -> Result<Option<Appointment>>;

    /// Returns whether a row was deleted.
    async fn delete_appointment(&self, id: Uuid) -> Result<bool>;

    /// SCHEDULED / CONFIRMED appointments not checked in, dated on or before `on_or_before`.
    async fn find_sweep_candidates(&self, on_or_before: NaiveDate) -> Result<Vec<Appointment>>;

    /// Sets status MISSED on the given ids that are still SCHEDULED / CONFIRMED
    /// and not checked in. Returns how many rows changed.
    async fn mark_missed(&self, ids: &[Uuid]) -> Result<u64>;

    async fn get_doctor(&self, id: Uuid) -> Result<Option<Doctor>>;

    /// Doctors accepting patients and not on leave, ordered by name.
    async fn list_doctors_on_duty(&self) -> Result<Vec<Doctor>>;

    /// A doctor's appointments on `date` in any of `statuses`, ordered by time.
    async fn doctor_appointments_on(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        statuses: &[AppointmentStatus],
    ) -> Result<Vec<Appointment>>;
}
