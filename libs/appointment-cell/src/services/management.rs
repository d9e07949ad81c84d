use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::{AppState, Directory};
use shared_models::{
    Appointment, AppointmentDetails, AppointmentFilter, AppointmentPatch, AppointmentStatus, Page,
    PageRequest,
};

use crate::models::AppointmentError;

/// Admin listing and editing of appointment records.
pub struct AppointmentManagementService {
    directory: Arc<dyn Directory>,
}

impl AppointmentManagementService {
    pub fn new(state: &AppState) -> Self {
        Self::with_directory(state.directory.clone())
    }

    pub fn with_directory(directory: Arc<dyn Directory>) -> Self {
        Self { directory }
    }

    pub async fn list_appointments(
        &self,
        filter: &AppointmentFilter,
        page: PageRequest,
    ) -> Result<Page<AppointmentDetails>, AppointmentError> {
        debug!("Listing appointments with {:?} page {} limit {}", filter, page.page, page.limit);
        Ok(self.directory.list_appointments(filter, page).await?)
    }

    pub async fn get_appointment(&self, id: Uuid) -> Result<Appointment, AppointmentError> {
        self.directory
            .get_appointment(id)
            .await?
            .ok_or(AppointmentError::NotFound)
    }

    pub async fn update_appointment(
        &self,
        id: Uuid,
        patch: &AppointmentPatch,
    ) -> Result<Appointment, AppointmentError> {
        validate_patch(patch)?;

        let stored = self.get_appointment(id).await?;
        validate_transition(&stored, patch)?;

        let updated = self
            .directory
            .update_appointment(id, patch)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        info!("Updated appointment {}", id);
        Ok(updated)
    }

    pub async fn delete_appointment(&self, id: Uuid) -> Result<(), AppointmentError> {
        if !self.directory.delete_appointment(id).await? {
            return Err(AppointmentError::NotFound);
        }

        info!("Deleted appointment {}", id);
        Ok(())
    }
}

fn validate_patch(patch: &AppointmentPatch) -> Result<(), AppointmentError> {
    if patch.is_empty() {
        return Err(AppointmentError::ValidationError(
            "No fields to update".to_string(),
        ));
    }

    // Check-in owns the queue number and timestamp
    if patch.status == Some(AppointmentStatus::CheckedIn) {
        warn!("Rejected status change to CHECKED_IN through update");
        return Err(AppointmentError::ValidationError(
            "Use check-in to set status CHECKED_IN".to_string(),
        ));
    }

    if let Some(kind) = &patch.appointment_type {
        if kind.trim().is_empty() {
            return Err(AppointmentError::ValidationError(
                "appointment_type must not be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// A checked-in visit keeps its queue number; only finishing or cancelling it is allowed.
fn validate_transition(
    stored: &Appointment,
    patch: &AppointmentPatch,
) -> Result<(), AppointmentError> {
    let Some(status) = patch.status else {
        return Ok(());
    };

    if stored.checked_in && !AppointmentStatus::AFTER_CHECK_IN.contains(&status) {
        warn!(
            "Rejected moving checked-in appointment {} back to {}",
            stored.id,
            status.as_str()
        );
        return Err(AppointmentError::ValidationError(format!(
            "Checked-in appointment cannot move to {}",
            status.as_str()
        )));
    }

    Ok(())
}
