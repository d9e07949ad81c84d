use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_models::{Appointment, Doctor};

// ==============================================================================
// SCHEDULE VIEW
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDoctor {
    pub id: Uuid,
    pub name: String,
    pub specialization: String,
    pub working_hours: String,
    pub consultation_duration: i32,
}

impl From<&Doctor> for ScheduleDoctor {
    fn from(doctor: &Doctor) -> Self {
        Self {
            id: doctor.id,
            name: doctor.name.clone(),
            specialization: doctor.specialization.clone(),
            working_hours: doctor.working_hours.clone(),
            consultation_duration: doctor.consultation_duration,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleStats {
    pub total_slots: u32,
    pub booked_slots: u32,
    pub available_slots: u32,
    /// Percentage with one decimal ("25.0"), or "0" when there are no slots.
    pub utilization_rate: String,
}

impl ScheduleStats {
    pub fn new(total_slots: u32, booked_slots: u32) -> Self {
        let utilization_rate = if total_slots == 0 {
            "0".to_string()
        } else {
            format!("{:.1}", f64::from(booked_slots) / f64::from(total_slots) * 100.0)
        };

        Self {
            total_slots,
            booked_slots,
            available_slots: total_slots.saturating_sub(booked_slots),
            utilization_rate,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorSchedule {
    pub doctor: ScheduleDoctor,
    pub appointments: Vec<Appointment>,
    pub stats: ScheduleStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableSlots {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub working_hours: String,
    pub slot_minutes: i64,
    /// Free slot start times as "HH:MM".
    pub slots: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleQuery {
    pub date: Option<String>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<anyhow::Error> for DoctorError {
    fn from(err: anyhow::Error) -> Self {
        DoctorError::DatabaseError(err.to_string())
    }
}
