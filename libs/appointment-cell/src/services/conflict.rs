use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::AppointmentError;
use crate::services::store::{AppointmentStore, BookedResource};

/// Double-booking checks for professionals and rooms.
///
/// Two appointments conflict when they start at the same instant and neither
/// is canceled. Durations are not compared.
#[derive(Clone)]
pub struct ConflictDetectionService {
    appointments: Arc<dyn AppointmentStore>,
}

impl ConflictDetectionService {
    pub fn new(appointments: Arc<dyn AppointmentStore>) -> Self {
        Self { appointments }
    }

    pub async fn ensure_free(
        &self,
        tenant_id: Uuid,
        resource: BookedResource,
        scheduled_at: DateTime<Utc>,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<(), AppointmentError> {
        debug!("Checking {:?} at {} for tenant {}", resource, scheduled_at, tenant_id);

        let clashing = self
            .appointments
            .find_active_at(tenant_id, resource, scheduled_at)
            .await?
            .into_iter()
            .filter(|a| Some(a.id) != exclude_appointment_id)
            .count();

        if clashing == 0 {
            return Ok(());
        }

        warn!(
            "Conflict detected for {:?} at {} - {} existing appointments",
            resource, scheduled_at, clashing
        );
        Err(match resource {
            BookedResource::Professional(_) => AppointmentError::ProfessionalConflict,
            BookedResource::Room(_) => AppointmentError::RoomConflict,
        })
    }
}
