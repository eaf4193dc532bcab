// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use patient_cell::{Patient, PatientDirectory, PatientSource};
use professional_cell::{ProfessionalDirectory, RoomDirectory};
use scheduling_cell::{
    parse_scheduled_at, AvailabilityRecord, AvailabilityStore, SlotKey, SlotScope,
};
use tenant_cell::TenantContext;

use crate::models::{
    Appointment, AppointmentError, BookingChannel, BookingRequest, CreateAppointmentRequest,
    PatientRef,
};
use crate::services::conflict::ConflictDetectionService;
use crate::services::saga::Saga;
use crate::services::store::{AppointmentStore, BookedResource};

/// Turns free slots into appointments and back.
///
/// Every write after a successful reservation is covered by a `Saga` so a
/// failed booking never leaves a slot consumed without an appointment.
#[derive(Clone)]
pub struct BookingEngine {
    pub(crate) availability: Arc<dyn AvailabilityStore>,
    pub(crate) appointments: Arc<dyn AppointmentStore>,
    patients: Arc<dyn PatientDirectory>,
    professionals: Arc<dyn ProfessionalDirectory>,
    rooms: Arc<dyn RoomDirectory>,
    conflicts: ConflictDetectionService,
}

impl BookingEngine {
    pub fn new(
        availability: Arc<dyn AvailabilityStore>,
        appointments: Arc<dyn AppointmentStore>,
        patients: Arc<dyn PatientDirectory>,
        professionals: Arc<dyn ProfessionalDirectory>,
        rooms: Arc<dyn RoomDirectory>,
    ) -> Self {
        let conflicts = ConflictDetectionService::new(Arc::clone(&appointments));
        Self {
            availability,
            appointments,
            patients,
            professionals,
            rooms,
            conflicts,
        }
    }

    pub async fn create_appointment(
        &self,
        ctx: &TenantContext,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        self.book(ctx, request.into()).await
    }

    #[instrument(skip(self, ctx, request), fields(tenant_id = %ctx.tenant_id, channel = ?request.channel))]
    pub async fn book(
        &self,
        ctx: &TenantContext,
        request: BookingRequest,
    ) -> Result<Appointment, AppointmentError> {
        let scheduled_at = parse_scheduled_at(&request.scheduled_at, &ctx.utc_offset)?;
        let key = SlotKey::from_instant(scheduled_at, &ctx.utc_offset);
        let scope = request.scope();

        let record = self.agenda_for(ctx, &key, &scope).await?;
        if request.channel == BookingChannel::Public && !record.is_open() {
            warn!("Public booking attempted on {} day {}", record.enabled_state, key.date);
            return Err(unavailable(&key));
        }

        if !self
            .availability
            .reserve(ctx.tenant_id, key.date, scope, &key.label)
            .await?
        {
            info!("Slot {} {} already taken", key.date, key.label);
            return Err(unavailable(&key));
        }

        let mut saga = Saga::new("book appointment");
        saga.on_abort(
            format!("release {} {}", key.date, key.label),
            self.release_action(ctx.tenant_id, key.clone(), scope),
        );

        let result = self.complete_booking(ctx, &request, scheduled_at, scope).await;
        let appointment = saga.finish(result).await?;

        info!(
            "Booked appointment {} at {} {} for tenant {}",
            appointment.id, key.date, key.label, ctx.tenant_id
        );
        Ok(appointment)
    }

    pub async fn get_appointment(
        &self,
        ctx: &TenantContext,
        id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        self.appointments
            .find(ctx.tenant_id, id)
            .await?
            .ok_or(AppointmentError::NotFound)
    }

    pub async fn list_appointments(
        &self,
        ctx: &TenantContext,
        professional_id: Option<i64>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        Ok(self.appointments.list(ctx.tenant_id, professional_id).await?)
    }

    /// Steps 4-8 of a booking; every failure here is compensated by the caller.
    async fn complete_booking(
        &self,
        ctx: &TenantContext,
        request: &BookingRequest,
        scheduled_at: DateTime<Utc>,
        scope: SlotScope,
    ) -> Result<Appointment, AppointmentError> {
        let patient = self.resolve_patient(ctx, &request.patient).await?;

        if let Some(professional_id) = scope.professional_id {
            self.professionals
                .find_by_id(ctx.tenant_id, professional_id)
                .await?
                .ok_or(AppointmentError::ProfessionalNotFound)?;
            self.conflicts
                .ensure_free(
                    ctx.tenant_id,
                    BookedResource::Professional(professional_id),
                    scheduled_at,
                    None,
                )
                .await?;
        }

        if let Some(room_id) = scope.room_id {
            self.rooms
                .find_by_id(ctx.tenant_id, room_id)
                .await?
                .ok_or(AppointmentError::RoomNotFound)?;
            self.conflicts
                .ensure_free(ctx.tenant_id, BookedResource::Room(room_id), scheduled_at, None)
                .await?;
        }

        let appointment =
            Appointment::new(ctx.tenant_id, &patient, scheduled_at, scope, &request.details);
        appointment.validate()?;

        Ok(self.appointments.insert(appointment).await?)
    }

    async fn resolve_patient(
        &self,
        ctx: &TenantContext,
        patient: &PatientRef,
    ) -> Result<Patient, AppointmentError> {
        match patient {
            PatientRef::Existing(raw) => {
                let raw = raw
                    .as_deref()
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .ok_or_else(|| AppointmentError::validation("patient_id", "is required"))?;

                let patient_id =
                    Uuid::parse_str(raw).map_err(|_| AppointmentError::PatientNotFound)?;

                self.patients
                    .find_by_id(ctx.tenant_id, patient_id)
                    .await?
                    .ok_or(AppointmentError::PatientNotFound)
            }
            PatientRef::Contact(contact) => {
                if contact.name.trim().is_empty() {
                    return Err(AppointmentError::validation("patient_name", "can't be blank"));
                }
                if contact.phone_value().is_none() {
                    return Err(AppointmentError::validation("patient_phone", "can't be blank"));
                }
                let mut patient = self
                    .patients
                    .find_or_create(ctx.tenant_id, contact, PatientSource::OnlineBooking)
                    .await?;
                // The appointment snapshots what was submitted, not the record on file.
                patient.name = contact.name.trim().to_string();
                patient.phone = contact.phone_value();
                if patient.document.is_none() {
                    patient.document = contact.document_digits();
                }
                Ok(patient)
            }
        }
    }

    pub(crate) async fn agenda_for(
        &self,
        ctx: &TenantContext,
        key: &SlotKey,
        scope: &SlotScope,
    ) -> Result<AvailabilityRecord, AppointmentError> {
        self.availability
            .find(ctx.tenant_id, key.date)
            .await?
            .filter(|record| record.matches(scope))
            .ok_or(AppointmentError::AgendaNotFound { date: key.date })
    }

    /// Compensation that hands `key` back to its availability record.
    pub(crate) fn release_action(
        &self,
        tenant_id: Uuid,
        key: SlotKey,
        scope: SlotScope,
    ) -> impl FnOnce() -> futures::future::BoxFuture<'static, Result<(), AppointmentError>> + Send + 'static
    {
        let availability = Arc::clone(&self.availability);
        move || {
            Box::pin(async move {
                let outcome = availability
                    .release(tenant_id, key.date, scope, &key.label)
                    .await?;
                debug!("Released {} {}: {:?}", key.date, key.label, outcome);
                Ok::<(), AppointmentError>(())
            })
        }
    }
}

pub(crate) fn unavailable(key: &SlotKey) -> AppointmentError {
    AppointmentError::SlotUnavailable {
        date: key.date,
        slot: key.label.clone(),
    }
}
