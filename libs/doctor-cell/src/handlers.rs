use axum::{
    extract::{Extension, State},
    Json,
};
use chrono::NaiveDate;
use tracing::error;
use uuid::Uuid;

use shared_database::AppState;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::{require_admin, ApiPath, ApiQuery};

use crate::models::{AvailableSlots, DoctorError, DoctorSchedule, ScheduleQuery};
use crate::services::DoctorScheduleService;

#[axum::debug_handler]
pub async fn get_doctor_schedules(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiQuery(query): ApiQuery<ScheduleQuery>,
) -> Result<Json<Vec<DoctorSchedule>>, AppError> {
    require_admin(&user)?;
    let date = parse_date(query.date.as_deref())?;

    let service = DoctorScheduleService::new(&state);
    let schedules = service
        .get_doctor_schedules(date)
        .await
        .map_err(|e| map_doctor_error(e, "Failed to load doctor schedules"))?;

    Ok(Json(schedules))
}

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(doctor_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<ScheduleQuery>,
) -> Result<Json<AvailableSlots>, AppError> {
    require_admin(&user)?;
    let date = parse_date(query.date.as_deref())?
        .ok_or_else(|| AppError::ValidationError("date is required (YYYY-MM-DD)".to_string()))?;

    let service = DoctorScheduleService::new(&state);
    let slots = service
        .get_available_slots(doctor_id, date)
        .await
        .map_err(|e| map_doctor_error(e, "Failed to load available slots"))?;

    Ok(Json(slots))
}

fn parse_date(raw: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
    raw.map(|value| {
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map_err(|_| AppError::ValidationError(format!("Invalid date '{}', expected YYYY-MM-DD", value)))
    })
    .transpose()
}

fn map_doctor_error(err: DoctorError, context: &str) -> AppError {
    match err {
        DoctorError::NotFound => AppError::NotFound("Doctor not found".to_string()),
        DoctorError::DatabaseError(detail) => {
            error!("{}: {}", context, detail);
            AppError::Internal(context.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date(None).unwrap(), None);
        assert_eq!(parse_date(Some("2026-10-19")).unwrap(), NaiveDate::from_ymd_opt(2026, 10, 19));
        assert_matches!(parse_date(Some("19/10/2026")), Err(AppError::ValidationError(_)));
    }

    #[test]
    fn test_database_detail_is_not_returned() {
        let err = map_doctor_error(DoctorError::DatabaseError("timeout at 10.0.0.3".into()), "Failed to load doctor schedules");
        assert_matches!(err, AppError::Internal(msg) if msg == "Failed to load doctor schedules");
    }
}
