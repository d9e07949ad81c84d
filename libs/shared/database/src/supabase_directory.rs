use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Method,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::{
    Appointment, AppointmentDetails, AppointmentFilter, AppointmentPatch, AppointmentStatus,
    Doctor, Page, PageRequest, Pagination,
};

use crate::directory::Directory;
use crate::supabase::SupabaseClient;

const APPOINTMENTS: &str = "/rest/v1/appointments";
const DOCTORS: &str = "/rest/v1/doctors";
const RESERVE_QUEUE_NUMBER_RPC: &str = "/rest/v1/rpc/reserve_queue_number";

/// Ids per bulk PATCH, keeps the `id=in.(...)` filter within URL limits.
const BULK_CHUNK: usize = 100;

#[derive(Debug, Deserialize)]
struct PatientName {
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct DoctorName {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AppointmentRow {
    #[serde(flatten)]
    appointment: Appointment,
    #[serde(default)]
    patients: Option<PatientName>,
    #[serde(default)]
    doctors: Option<DoctorName>,
}

impl From<AppointmentRow> for AppointmentDetails {
    fn from(row: AppointmentRow) -> Self {
        Self {
            appointment: row.appointment,
            patient_name: row.patients.map(|p| p.full_name),
            doctor_name: row.doctors.map(|d| d.name),
        }
    }
}

/// `Directory` backed by Supabase PostgREST.
///
/// Uses the service role key, so row level security does not narrow the
/// admin's view of the clinic.
pub struct SupabaseDirectory {
    supabase: SupabaseClient,
    token: String,
}

impl SupabaseDirectory {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            token: config.directory_key().to_string(),
        }
    }

    fn representation_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }

    async fn fetch_appointments(&self, path: &str) -> Result<Vec<Appointment>> {
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, path, Some(&self.token), None)
            .await?;
        parse_rows(rows)
    }

    async fn patch_appointments(&self, path: &str, body: Value) -> Result<Vec<Appointment>> {
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                path,
                Some(&self.token),
                Some(body),
                Some(Self::representation_headers()),
            )
            .await?;
        parse_rows(rows)
    }
}

fn parse_rows<T: for<'de> Deserialize<'de>>(rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(|e| anyhow!("Failed to parse row: {}", e)))
        .collect()
}

fn encode_instant(instant: DateTime<Utc>) -> String {
    urlencoding::encode(&instant.to_rfc3339()).into_owned()
}

fn status_list(statuses: &[AppointmentStatus]) -> String {
    let names: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();
    format!("in.({})", names.join(","))
}

/// PostgREST select + filter parameters for an appointment filter.
pub fn appointment_filter_query(filter: &AppointmentFilter) -> Vec<String> {
    let mut query_parts = Vec::new();

    if filter.patient_name_term().is_some() {
        query_parts.push("select=*,patients!inner(full_name),doctors(name)".to_string());
    } else {
        query_parts.push("select=*,patients(full_name),doctors(name)".to_string());
    }
    if let Some(status) = filter.status {
        query_parts.push(format!("status=eq.{}", status));
    }
    if let Some(doctor_id) = filter.doctor_id {
        query_parts.push(format!("doctor_id=eq.{}", doctor_id));
    }
    if let Some(from) = filter.date_from {
        query_parts.push(format!("appointment_date=gte.{}", from));
    }
    if let Some(to) = filter.date_to {
        query_parts.push(format!("appointment_date=lte.{}", to));
    }
    if let Some(term) = filter.patient_name_term() {
        query_parts.push(format!(
            "patients.full_name=ilike.*{}*",
            urlencoding::encode(term)
        ));
    }

    query_parts
}

#[async_trait]
impl Directory for SupabaseDirectory {
    async fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>> {
        debug!("Fetching appointment: {}", id);
        let path = format!("{}?id=eq.{}", APPOINTMENTS, id);
        Ok(self.fetch_appointments(&path).await?.into_iter().next())
    }

    async fn list_appointments(
        &self,
        filter: &AppointmentFilter,
        page: PageRequest,
    ) -> Result<Page<AppointmentDetails>> {
        debug!("Listing appointments with filter: {:?}", filter);

        let path = format!(
            "{}?{}&order=appointment_date.desc,appointment_time.desc&limit={}&offset={}",
            APPOINTMENTS,
            appointment_filter_query(filter).join("&"),
            page.limit,
            page.offset(),
        );

        let (rows, total): (Vec<Value>, u64) = self
            .supabase
            .request_with_count(Method::GET, &path, Some(&self.token))
            .await?;

        let items = parse_rows::<AppointmentRow>(rows)?
            .into_iter()
            .map(AppointmentDetails::from)
            .collect();

        Ok(Page {
            items,
            pagination: Pagination::new(page, total),
        })
    }

    async fn count_appointments(&self, filter: &AppointmentFilter) -> Result<u64> {
        let path = format!(
            "{}?{}&limit=1",
            APPOINTMENTS,
            appointment_filter_query(filter).join("&"),
        );
        let (_, total): (Vec<Value>, u64) = self
            .supabase
            .request_with_count(Method::GET, &path, Some(&self.token))
            .await?;
        Ok(total)
    }

    async fn count_checked_in_between(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<u64> {
        let path = format!(
            "{}?select=id&checked_in=is.true&checked_in_at=gte.{}&checked_in_at=lt.{}&limit=1",
            APPOINTMENTS,
            encode_instant(from),
            encode_instant(until),
        );
        let (_, total): (Vec<Value>, u64) = self
            .supabase
            .request_with_count(Method::GET, &path, Some(&self.token))
            .await?;
        Ok(total)
    }

    async fn reserve_queue_number(
        &self,
        day: NaiveDate,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<u32> {
        let body = json!({
            "p_day": day.to_string(),
            "p_window_start": window_start.to_rfc3339(),
            "p_window_end": window_end.to_rfc3339(),
        });

        let value: i64 = self
            .supabase
            .request(Method::POST, RESERVE_QUEUE_NUMBER_RPC, Some(&self.token), Some(body))
            .await?;

        let sequence = u32::try_from(value)
            .map_err(|_| anyhow!("Queue counter returned out of range value {}", value))?;
        debug!("Reserved queue sequence {} for {}", sequence, day);
        Ok(sequence)
    }

    async fn mark_checked_in(
        &self,
        id: Uuid,
        checked_in_at: DateTime<Utc>,
        queue_number: &str,
    ) -> Result<Option<Appointment>> {
        let path = format!("{}?id=eq.{}&checked_in=is.false", APPOINTMENTS, id);
        let body = json!({
            "checked_in": true,
            "checked_in_at": checked_in_at.to_rfc3339(),
            "queue_number": queue_number,
            "status": AppointmentStatus::CheckedIn,
            "updated_at": checked_in_at.to_rfc3339(),
        });
        Ok(self.patch_appointments(&path, body).await?.into_iter().next())
    }

    async fn update_appointment(
        &self,
        id: Uuid,
        patch: &AppointmentPatch,
    ) -> Result<Option<Appointment>> {
        let mut update_data = serde_json::Map::new();

        if let Some(status) = patch.status {
            update_data.insert("status".to_string(), json!(status));
        }
        if let Some(date) = patch.appointment_date {
            update_data.insert("appointment_date".to_string(), json!(date.to_string()));
        }
        if let Some(time) = patch.appointment_time {
            update_data.insert(
                "appointment_time".to_string(),
                json!(time.format("%H:%M:%S").to_string()),
            );
        }
        if let Some(kind) = &patch.appointment_type {
            update_data.insert("appointment_type".to_string(), json!(kind));
        }
        if let Some(notes) = &patch.notes {
            update_data.insert("notes".to_string(), json!(notes));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("{}?id=eq.{}", APPOINTMENTS, id);
        Ok(self
            .patch_appointments(&path, Value::Object(update_data))
            .await?
            .into_iter()
            .next())
    }

    async fn delete_appointment(&self, id: Uuid) -> Result<bool> {
        let path = format!("{}?id=eq.{}", APPOINTMENTS, id);
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                Some(&self.token),
                None,
                Some(Self::representation_headers()),
            )
            .await?;
        Ok(!rows.is_empty())
    }

    async fn find_sweep_candidates(&self, on_or_before: NaiveDate) -> Result<Vec<Appointment>> {
        let path = format!(
            "{}?status={}&checked_in=is.false&appointment_date=lte.{}",
            APPOINTMENTS,
            status_list(&AppointmentStatus::SWEEPABLE),
            on_or_before,
        );
        self.fetch_appointments(&path).await
    }

    async fn mark_missed(&self, ids: &[Uuid]) -> Result<u64> {
        let mut changed = 0u64;

        for chunk in ids.chunks(BULK_CHUNK) {
            let id_list: Vec<String> = chunk.iter().map(Uuid::to_string).collect();
            let path = format!(
                "{}?id=in.({})&status={}&checked_in=is.false",
                APPOINTMENTS,
                id_list.join(","),
                status_list(&AppointmentStatus::SWEEPABLE),
            );
            let updated = self
                .patch_appointments(&path, json!({ "status": AppointmentStatus::Missed }))
                .await?;
            changed += updated.len() as u64;
        }

        if changed > 0 {
            info!("Marked {} appointments as missed", changed);
        }
        Ok(changed)
    }

    async fn get_doctor(&self, id: Uuid) -> Result<Option<Doctor>> {
        let path = format!("{}?id=eq.{}", DOCTORS, id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(&self.token), None)
            .await?;
        Ok(parse_rows::<Doctor>(rows)?.into_iter().next())
    }

    async fn list_doctors_on_duty(&self) -> Result<Vec<Doctor>> {
        let path = format!(
            "{}?accepting_patients=is.true&on_leave=is.false&order=name.asc",
            DOCTORS
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(&self.token), None)
            .await?;
        parse_rows(rows)
    }

    async fn doctor_appointments_on(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        statuses: &[AppointmentStatus],
    ) -> Result<Vec<Appointment>> {
        let path = format!(
            "{}?doctor_id=eq.{}&appointment_date=eq.{}&status={}&order=appointment_time.asc",
            APPOINTMENTS,
            doctor_id,
            date,
            status_list(statuses),
        );
        self.fetch_appointments(&path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_query_uses_inner_join_for_name_search() {
        let filter = AppointmentFilter {
            status: Some(AppointmentStatus::Confirmed),
            patient_name_contains: Some("Priya S".to_string()),
            ..Default::default()
        };
        let parts = appointment_filter_query(&filter);
        assert_eq!(parts[0], "select=*,patients!inner(full_name),doctors(name)");
        assert!(parts.contains(&"status=eq.CONFIRMED".to_string()));
        assert!(parts.contains(&"patients.full_name=ilike.*Priya%20S*".to_string()));
    }

    #[test]
    fn test_filter_query_without_name_uses_left_join() {
        let parts = appointment_filter_query(&AppointmentFilter::default());
        assert_eq!(parts, vec!["select=*,patients(full_name),doctors(name)".to_string()]);
    }

    #[test]
    fn test_status_list() {
        assert_eq!(status_list(&AppointmentStatus::SWEEPABLE), "in.(SCHEDULED,CONFIRMED)");
    }
}
