use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_models::{Appointment, AppointmentFilter, AppointmentStatus, PageRequest};

// ==============================================================================
// OPERATION RESULTS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInResult {
    pub queue_number: String,
    pub appointment: Appointment,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SweepResult {
    pub missed_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusCount {
    pub status: AppointmentStatus,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub date: NaiveDate,
    pub total_appointments: u64,
    pub by_status: Vec<StatusCount>,
    pub todays_appointments: u64,
    pub checked_in_today: u64,
    pub upcoming_appointments: u64,
    pub doctors_on_duty: u64,
    /// Appointments reclassified as missed while loading this dashboard.
    pub missed_swept: u64,
}

// ==============================================================================
// QUERY PARAMETERS
// ==============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct AppointmentListQuery {
    pub status: Option<String>,
    pub patient_name: Option<String>,
    pub doctor_id: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl AppointmentListQuery {
    pub fn to_filter(&self) -> Result<(AppointmentFilter, PageRequest), AppointmentError> {
        let status = self.status.as_deref().map(parse_status).transpose()?;

        let doctor_id = self
            .doctor_id
            .as_deref()
            .map(|raw| {
                Uuid::parse_str(raw)
                    .map_err(|_| AppointmentError::ValidationError(format!("Invalid doctor_id '{}'", raw)))
            })
            .transpose()?;

        let date_from = self.date_from.as_deref().map(parse_date).transpose()?;
        let date_to = self.date_to.as_deref().map(parse_date).transpose()?;

        if let (Some(from), Some(to)) = (date_from, date_to) {
            if from > to {
                return Err(AppointmentError::ValidationError(
                    "date_from must not be after date_to".to_string(),
                ));
            }
        }

        let filter = AppointmentFilter {
            status,
            patient_name_contains: self.patient_name.clone(),
            doctor_id,
            date_from,
            date_to,
        };

        Ok((filter, PageRequest::new(self.page, self.limit)))
    }
}

/// Case-insensitive status name, e.g. "scheduled" or "CHECKED_IN".
pub fn parse_status(raw: &str) -> Result<AppointmentStatus, AppointmentError> {
    AppointmentStatus::ALL
        .iter()
        .copied()
        .find(|status| status.as_str().eq_ignore_ascii_case(raw.trim()))
        .ok_or_else(|| AppointmentError::ValidationError(format!("Unknown appointment status '{}'", raw)))
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, AppointmentError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppointmentError::ValidationError(format!("Invalid date '{}', expected YYYY-MM-DD", raw)))
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Appointment already checked in")]
    AlreadyCheckedIn,

    #[error("Cannot check in past appointment")]
    PastAppointment,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<anyhow::Error> for AppointmentError {
    fn from(err: anyhow::Error) -> Self {
        AppointmentError::DatabaseError(err.to_string())
    }
}
