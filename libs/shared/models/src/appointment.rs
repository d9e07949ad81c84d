use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==============================================================================
// CORE APPOINTMENT RECORD
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub appointment_number: String,
    pub appointment_type: String,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_date: NaiveDate,
    #[serde(with = "crate::time_format")]
    pub appointment_time: NaiveTime,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub checked_in: bool,
    #[serde(default)]
    pub checked_in_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub queue_number: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    CheckedIn,
    Completed,
    Cancelled,
    Missed,
    Pending,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 7] = [
        AppointmentStatus::Scheduled,
        AppointmentStatus::Confirmed,
        AppointmentStatus::CheckedIn,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::Missed,
        AppointmentStatus::Pending,
    ];

    /// Statuses that occupy a slot in a doctor's day.
    pub const ACTIVE: [AppointmentStatus; 3] = [
        AppointmentStatus::Scheduled,
        AppointmentStatus::Confirmed,
        AppointmentStatus::CheckedIn,
    ];

    /// Statuses the missed-appointment sweep may reclassify.
    pub const SWEEPABLE: [AppointmentStatus; 2] = [
        AppointmentStatus::Scheduled,
        AppointmentStatus::Confirmed,
    ];

    /// Statuses a checked-in appointment may still move to.
    pub const AFTER_CHECK_IN: [AppointmentStatus; 2] = [
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
    ];

    pub fn is_sweepable(&self) -> bool {
        Self::SWEEPABLE.contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "SCHEDULED",
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::CheckedIn => "CHECKED_IN",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::Cancelled => "CANCELLED",
            AppointmentStatus::Missed => "MISSED",
            AppointmentStatus::Pending => "PENDING",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Appointment enriched with the names an admin listing shows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentDetails {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub patient_name: Option<String>,
    pub doctor_name: Option<String>,
}

// ==============================================================================
// QUERY / MUTATION MODELS
// ==============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppointmentFilter {
    pub status: Option<AppointmentStatus>,
    pub patient_name_contains: Option<String>,
    pub doctor_id: Option<Uuid>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl AppointmentFilter {
    pub fn matches(&self, appointment: &Appointment, patient_name: Option<&str>) -> bool {
        if let Some(status) = self.status {
            if appointment.status != status {
                return false;
            }
        }
        if let Some(doctor_id) = self.doctor_id {
            if appointment.doctor_id != doctor_id {
                return false;
            }
        }
        if let Some(from) = self.date_from {
            if appointment.appointment_date < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if appointment.appointment_date > to {
                return false;
            }
        }
        if let Some(needle) = self.patient_name_term() {
            let needle = needle.to_lowercase();
            match patient_name {
                Some(name) if name.to_lowercase().contains(&needle) => {}
                _ => return false,
            }
        }
        true
    }

    /// Trimmed, non-empty patient name search term.
    pub fn patient_name_term(&self) -> Option<&str> {
        self.patient_name_contains
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}

/// Explicit partial update of the fields an admin may edit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppointmentPatch {
    pub status: Option<AppointmentStatus>,
    pub appointment_date: Option<NaiveDate>,
    #[serde(default, with = "crate::time_format::option")]
    pub appointment_time: Option<NaiveTime>,
    pub appointment_type: Option<String>,
    pub notes: Option<String>,
}

impl AppointmentPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.appointment_date.is_none()
            && self.appointment_time.is_none()
            && self.appointment_type.is_none()
            && self.notes.is_none()
    }

    pub fn apply_to(&self, appointment: &mut Appointment) {
        if let Some(status) = self.status {
            appointment.status = status;
        }
        if let Some(date) = self.appointment_date {
            appointment.appointment_date = date;
        }
        if let Some(time) = self.appointment_time {
            appointment.appointment_time = time;
        }
        if let Some(kind) = &self.appointment_type {
            appointment.appointment_type = kind.clone();
        }
        if let Some(notes) = &self.notes {
            appointment.notes = Some(notes.clone());
        }
    }
}

// ==============================================================================
// PAGINATION
// ==============================================================================

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// 1-based page, limit clamped to `1..=MAX_PAGE_LIMIT`.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(request: PageRequest, total: u64) -> Self {
        Self {
            page: request.page,
            limit: request.limit,
            total,
            total_pages: total.div_ceil(request.limit as u64),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Appointment {
        serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "appointment_number": "APT-0001",
            "appointment_type": "ANTENATAL_CHECKUP",
            "patient_id": Uuid::new_v4(),
            "doctor_id": Uuid::new_v4(),
            "appointment_date": "2026-10-19",
            "appointment_time": "10:30:00",
            "status": "SCHEDULED",
            "created_at": "2026-10-01T08:00:00Z",
            "updated_at": "2026-10-01T08:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_appointment_deserializes_store_row() {
        let appointment = sample();
        assert_eq!(appointment.status, AppointmentStatus::Scheduled);
        assert_eq!(appointment.appointment_time, NaiveTime::from_hms_opt(10, 30, 0).unwrap());
        assert!(!appointment.checked_in);
        assert!(appointment.queue_number.is_none());

        let value = serde_json::to_value(&appointment).unwrap();
        assert_eq!(value["appointment_time"], "10:30");
        assert_eq!(value["status"], "SCHEDULED");
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_value(AppointmentStatus::CheckedIn).unwrap(), "CHECKED_IN");
        let parsed: AppointmentStatus = serde_json::from_value(json!("MISSED")).unwrap();
        assert_eq!(parsed, AppointmentStatus::Missed);
        assert_eq!(AppointmentStatus::Confirmed.to_string(), "CONFIRMED");
    }

    #[test]
    fn test_filter_matches_patient_name_case_insensitively() {
        let appointment = sample();
        let filter = AppointmentFilter {
            patient_name_contains: Some("  priya ".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&appointment, Some("Priya Sharma")));
        assert!(!filter.matches(&appointment, Some("Anita Rao")));
        assert!(!filter.matches(&appointment, None));
    }

    #[test]
    fn test_filter_date_range_is_inclusive() {
        let appointment = sample();
        let day = appointment.appointment_date;
        let filter = AppointmentFilter {
            date_from: Some(day),
            date_to: Some(day),
            ..Default::default()
        };
        assert!(filter.matches(&appointment, None));

        let later = AppointmentFilter {
            date_from: day.succ_opt(),
            ..Default::default()
        };
        assert!(!later.matches(&appointment, None));
    }

    #[test]
    fn test_page_request_clamps() {
        assert_eq!(PageRequest::new(Some(0), Some(0)), PageRequest { page: 1, limit: 1 });
        assert_eq!(PageRequest::new(None, Some(500)).limit, MAX_PAGE_LIMIT);
        assert_eq!(PageRequest::new(Some(3), Some(20)).offset(), 40);
    }

    #[test]
    fn test_pagination_total_pages() {
        let request = PageRequest::new(Some(1), Some(10));
        assert_eq!(Pagination::new(request, 0).total_pages, 0);
        assert_eq!(Pagination::new(request, 10).total_pages, 1);
        assert_eq!(Pagination::new(request, 11).total_pages, 2);
    }

    #[test]
    fn test_patch_apply_and_empty() {
        assert!(AppointmentPatch::default().is_empty());

        let mut appointment = sample();
        let patch = AppointmentPatch {
            status: Some(AppointmentStatus::Confirmed),
            notes: Some("bring previous scan reports".to_string()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
        patch.apply_to(&mut appointment);
        assert_eq!(appointment.status, AppointmentStatus::Confirmed);
        assert_eq!(appointment.notes.as_deref(), Some("bring previous scan reports"));
    }
}
