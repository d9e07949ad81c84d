use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use shared_models::{
    Appointment, AppointmentDetails, AppointmentFilter, AppointmentPatch, AppointmentStatus,
    Doctor, Page, PageRequest, Pagination, Patient,
};

use crate::directory::Directory;

#[derive(Default)]
struct MemoryState {
    appointments: HashMap<Uuid, Appointment>,
    doctors: HashMap<Uuid, Doctor>,
    patients: HashMap<Uuid, Patient>,
    queue_counters: HashMap<NaiveDate, u32>,
}

impl MemoryState {
    fn patient_name(&self, id: Uuid) -> Option<&str> {
        self.patients.get(&id).map(|p| p.full_name.as_str())
    }

    fn filtered<'a>(&'a self, filter: &'a AppointmentFilter) -> impl Iterator<Item = &'a Appointment> {
        self.appointments
            .values()
            .filter(move |a| filter.matches(a, self.patient_name(a.patient_id)))
    }

    fn checked_in_between(&self, from: DateTime<Utc>, until: DateTime<Utc>) -> u64 {
        self.appointments
            .values()
            .filter(|a| a.checked_in)
            .filter(|a| matches!(a.checked_in_at, Some(at) if at >= from && at < until))
            .count() as u64
    }
}

/// Process-local `Directory` guarded by one async mutex. Every trait method
/// holds the lock for its whole duration, which makes each one atomic.
#[derive(Default)]
pub struct InMemoryDirectory {
    state: Mutex<MemoryState>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_appointment(&self, appointment: Appointment) {
        self.state
            .lock()
            .await
            .appointments
            .insert(appointment.id, appointment);
    }

    pub async fn insert_doctor(&self, doctor: Doctor) {
        self.state.lock().await.doctors.insert(doctor.id, doctor);
    }

    pub async fn insert_patient(&self, patient: Patient) {
        self.state.lock().await.patients.insert(patient.id, patient);
    }

    pub async fn appointments(&self) -> Vec<Appointment> {
        self.state.lock().await.appointments.values().cloned().collect()
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>> {
        Ok(self.state.lock().await.appointments.get(&id).cloned())
    }

    async fn list_appointments(
        &self,
        filter: &AppointmentFilter,
        page: PageRequest,
    ) -> Result<Page<AppointmentDetails>> {
        let state = self.state.lock().await;

        let mut matching: Vec<&Appointment> = state.filtered(filter).collect();
        matching.sort_by(|a, b| {
            (b.appointment_date, b.appointment_time).cmp(&(a.appointment_date, a.appointment_time))
        });
        let total = matching.len() as u64;

        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .map(|a| AppointmentDetails {
                appointment: a.clone(),
                patient_name: state.patient_name(a.patient_id).map(str::to_string),
                doctor_name: state.doctors.get(&a.doctor_id).map(|d| d.name.clone()),
            })
            .collect();

        Ok(Page {
            items,
            pagination: Pagination::new(page, total),
        })
    }

    async fn count_appointments(&self, filter: &AppointmentFilter) -> Result<u64> {
        Ok(self.state.lock().await.filtered(filter).count() as u64)
    }

    async fn count_checked_in_between(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<u64> {
        Ok(self.state.lock().await.checked_in_between(from, until))
    }

    async fn reserve_queue_number(
        &self,
        day: NaiveDate,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<u32> {
        let mut state = self.state.lock().await;
        let seed = state.checked_in_between(window_start, window_end) as u32;
        let counter = state.queue_counters.entry(day).or_insert(seed);
        *counter += 1;
        Ok(*counter)
    }

    async fn mark_checked_in(
        &self,
        id: Uuid,
        checked_in_at: DateTime<Utc>,
        queue_number: &str,
    ) -> Result<Option<Appointment>> {
        let mut state = self.state.lock().await;
        match state.appointments.get_mut(&id) {
            Some(appointment) if !appointment.checked_in => {
                appointment.checked_in = true;
                appointment.checked_in_at = Some(checked_in_at);
                appointment.queue_number = Some(queue_number.to_string());
                appointment.status = AppointmentStatus::CheckedIn;
                appointment.updated_at = checked_in_at;
                Ok(Some(appointment.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn update_appointment(
        &self,
        id: Uuid,
        patch: &AppointmentPatch,
    ) -> Result<Option<Appointment>> {
        let mut state = self.state.lock().await;
        Ok(state.appointments.get_mut(&id).map(|appointment| {
            patch.apply_to(appointment);
            appointment.updated_at = Utc::now();
            appointment.clone()
        }))
    }

    async fn delete_appointment(&self, id: Uuid) -> Result<bool> {
        Ok(self.state.lock().await.appointments.remove(&id).is_some())
    }

    async fn find_sweep_candidates(&self, on_or_before: NaiveDate) -> Result<Vec<Appointment>> {
        let state = self.state.lock().await;
        Ok(state
            .appointments
            .values()
            .filter(|a| a.status.is_sweepable() && !a.checked_in)
            .filter(|a| a.appointment_date <= on_or_before)
            .cloned()
            .collect())
    }

    async fn mark_missed(&self, ids: &[Uuid]) -> Result<u64> {
        let mut state = self.state.lock().await;
        let mut changed = 0;
        for id in ids {
            if let Some(appointment) = state.appointments.get_mut(id) {
                if appointment.status.is_sweepable() && !appointment.checked_in {
                    appointment.status = AppointmentStatus::Missed;
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }

    async fn get_doctor(&self, id: Uuid) -> Result<Option<Doctor>> {
        Ok(self.state.lock().await.doctors.get(&id).cloned())
    }

    async fn list_doctors_on_duty(&self) -> Result<Vec<Doctor>> {
        let state = self.state.lock().await;
        let mut doctors: Vec<Doctor> = state
            .doctors
            .values()
            .filter(|d| d.is_on_duty())
            .cloned()
            .collect();
        doctors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(doctors)
    }

    async fn doctor_appointments_on(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        statuses: &[AppointmentStatus],
    ) -> Result<Vec<Appointment>> {
        let state = self.state.lock().await;
        let mut appointments: Vec<Appointment> = state
            .appointments
            .values()
            .filter(|a| a.doctor_id == doctor_id && a.appointment_date == date)
            .filter(|a| statuses.contains(&a.status))
            .cloned()
            .collect();
        appointments.sort_by_key(|a| a.appointment_time);
        Ok(appointments)
    }
}
