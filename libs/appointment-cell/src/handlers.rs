use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::error;
use uuid::Uuid;

use shared_database::AppState;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::{Appointment, AppointmentDetails, AppointmentPatch, Page};
use shared_utils::extractor::{require_admin, ApiJson, ApiPath, ApiQuery};

use crate::models::{AppointmentError, AppointmentListQuery, CheckInResult, DashboardStats, SweepResult};
use crate::services::{
    AppointmentManagementService, CheckInService, DashboardService, MissedAppointmentSweeper,
};

#[axum::debug_handler]
pub async fn check_in_appointment(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(appointment_id): ApiPath<Uuid>,
) -> Result<Json<CheckInResult>, AppError> {
    require_admin(&user)?;

    let result = CheckInService::new(&state)
        .check_in(appointment_id)
        .await
        .map_err(|e| map_appointment_error(e, "Failed to check in appointment"))?;

    Ok(Json(result))
}

#[axum::debug_handler]
pub async fn sweep_missed_appointments(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<SweepResult>, AppError> {
    require_admin(&user)?;

    let result = MissedAppointmentSweeper::new(&state)
        .sweep()
        .await
        .map_err(|e| map_appointment_error(e, "Failed to sweep missed appointments"))?;

    Ok(Json(result))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiQuery(query): ApiQuery<AppointmentListQuery>,
) -> Result<Json<Page<AppointmentDetails>>, AppError> {
    require_admin(&user)?;
    let (filter, page) = query
        .to_filter()
        .map_err(|e| map_appointment_error(e, "Failed to list appointments"))?;

    let page = AppointmentManagementService::new(&state)
        .list_appointments(&filter, page)
        .await
        .map_err(|e| map_appointment_error(e, "Failed to list appointments"))?;

    Ok(Json(page))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(appointment_id): ApiPath<Uuid>,
) -> Result<Json<Appointment>, AppError> {
    require_admin(&user)?;

    let appointment = AppointmentManagementService::new(&state)
        .get_appointment(appointment_id)
        .await
        .map_err(|e| map_appointment_error(e, "Failed to load appointment"))?;

    Ok(Json(appointment))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(appointment_id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<AppointmentPatch>,
) -> Result<Json<Appointment>, AppError> {
    require_admin(&user)?;

    let appointment = AppointmentManagementService::new(&state)
        .update_appointment(appointment_id, &patch)
        .await
        .map_err(|e| map_appointment_error(e, "Failed to update appointment"))?;

    Ok(Json(appointment))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(appointment_id): ApiPath<Uuid>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_admin(&user)?;

    AppointmentManagementService::new(&state)
        .delete_appointment(appointment_id)
        .await
        .map_err(|e| map_appointment_error(e, "Failed to delete appointment"))?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "Appointment deleted successfully"
        })),
    ))
}

#[axum::debug_handler]
pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<DashboardStats>, AppError> {
    require_admin(&user)?;

    let stats = DashboardService::new(&state)
        .get_dashboard()
        .await
        .map_err(|e| map_appointment_error(e, "Failed to load dashboard"))?;

    Ok(Json(stats))
}

fn map_appointment_error(err: AppointmentError, context: &str) -> AppError {
    match err {
        AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        AppointmentError::AlreadyCheckedIn => {
            AppError::Conflict("Appointment already checked in".to_string())
        }
        AppointmentError::PastAppointment => {
            AppError::Conflict("Cannot check in past appointment".to_string())
        }
        AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
        AppointmentError::DatabaseError(detail) => {
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
    fn test_error_mapping() {
        assert_matches!(
            map_appointment_error(AppointmentError::AlreadyCheckedIn, "ctx"),
            AppError::Conflict(_)
        );
        assert_matches!(
            map_appointment_error(AppointmentError::PastAppointment, "ctx"),
            AppError::Conflict(_)
        );
        assert_matches!(
            map_appointment_error(AppointmentError::NotFound, "ctx"),
            AppError::NotFound(_)
        );
        assert_matches!(
            map_appointment_error(AppointmentError::DatabaseError("connection reset".into()), "Failed to check in appointment"),
            AppError::Internal(msg) if msg == "Failed to check in appointment"
        );
    }
}
