// libs/appointment-cell/src/services/lifecycle.rs
use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use scheduling_cell::{parse_scheduled_at, ReleaseOutcome, SlotKey};
use tenant_cell::TenantContext;

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, RescheduleAppointmentRequest,
};
use crate::services::booking::{unavailable, BookingEngine};
use crate::services::saga::Saga;

/// Statuses an appointment may move to through an update. Cancellation has
/// its own operation because it returns the slot.
pub fn valid_transitions(current: AppointmentStatus) -> &'static [AppointmentStatus] {
    use AppointmentStatus::*;
    match current {
        Scheduled => &[Scheduled, Confirmed, Completed, NoShow],
        Confirmed => &[Confirmed, Scheduled, Completed, NoShow],
        Completed => &[Completed],
        NoShow => &[NoShow, Scheduled],
        Canceled => &[],
    }
}

pub fn validate_status_transition(
    current: AppointmentStatus,
    next: AppointmentStatus,
) -> Result<(), AppointmentError> {
    if valid_transitions(current).contains(&next) {
        Ok(())
    } else {
        warn!("Invalid status transition attempted: {} -> {}", current, next);
        Err(AppointmentError::InvalidStatusTransition {
            from: current,
            to: next,
        })
    }
}

impl BookingEngine {
    /// Updates an appointment, moving it to a new slot when `scheduled_at`
    /// lands on a different (date, slot).
    #[instrument(skip(self, ctx, request), fields(tenant_id = %ctx.tenant_id))]
    pub async fn reschedule_appointment(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        request: RescheduleAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let current = self
            .appointments
            .find(ctx.tenant_id, id)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        if current.is_canceled() {
            return Err(AppointmentError::AlreadyCanceled);
        }
        if let Some(next) = request.status {
            validate_status_transition(current.status, next)?;
        }

        let new_at = request
            .scheduled_at
            .as_deref()
            .map(|raw| parse_scheduled_at(raw, &ctx.utc_offset))
            .transpose()?;

        let old_key = current.slot_key(&ctx.utc_offset);
        let mut updated = apply_updates(current.clone(), &request);

        let new_at = match new_at {
            Some(at) if SlotKey::from_instant(at, &ctx.utc_offset) != old_key => at,
            same_slot => {
                if let Some(at) = same_slot {
                    updated.scheduled_at = at;
                }
                updated.validate()?;
                let saved = self.appointments.update(updated).await?;
                debug!("Updated appointment {} without moving it", saved.id);
                return Ok(saved);
            }
        };

        let new_key = SlotKey::from_instant(new_at, &ctx.utc_offset);
        let scope = current.scope();

        self.agenda_for(ctx, &new_key, &scope).await?;
        if !self
            .availability
            .reserve(ctx.tenant_id, new_key.date, scope, &new_key.label)
            .await?
        {
            info!("Reschedule target {} {} already taken", new_key.date, new_key.label);
            return Err(unavailable(&new_key));
        }

        let mut saga = Saga::new("reschedule appointment");
        saga.on_abort(
            format!("release {} {}", new_key.date, new_key.label),
            self.release_action(ctx.tenant_id, new_key.clone(), scope),
        );

        let returned_old = match self
            .availability
            .release(ctx.tenant_id, old_key.date, scope, &old_key.label)
            .await
        {
            Ok(outcome) => outcome == ReleaseOutcome::Released,
            Err(err) => {
                warn!("Could not return {} {}: {}", old_key.date, old_key.label, err);
                false
            }
        };

        if returned_old {
            let availability = Arc::clone(&self.availability);
            let tenant_id = ctx.tenant_id;
            let old = old_key.clone();
            saga.on_abort(format!("re-reserve {} {}", old_key.date, old_key.label), move || async move {
                if availability
                    .reserve(tenant_id, old.date, scope, &old.label)
                    .await?
                {
                    Ok::<(), AppointmentError>(())
                } else {
                    error!(
                        "Slot {} {} was taken while rescheduling; appointment keeps a slot it no longer holds",
                        old.date, old.label
                    );
                    Err(AppointmentError::InconsistentState(format!(
                        "original slot {} {} was taken by another booking",
                        old.date, old.label
                    )))
                }
            });
        }

        updated.scheduled_at = new_at;
        let result = match updated.validate() {
            Ok(()) => self.appointments.update(updated).await.map_err(AppointmentError::from),
            Err(err) => Err(err),
        };
        let saved = saga.finish(result).await?;

        info!(
            "Rescheduled appointment {} from {} {} to {} {}",
            saved.id, old_key.date, old_key.label, new_key.date, new_key.label
        );
        Ok(saved)
    }

    /// Marks the appointment canceled, then gives its slot back.
    #[instrument(skip(self, ctx), fields(tenant_id = %ctx.tenant_id))]
    pub async fn cancel_appointment(
        &self,
        ctx: &TenantContext,
        id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        let mut appointment = self
            .appointments
            .find(ctx.tenant_id, id)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        if appointment.is_canceled() {
            return Err(AppointmentError::AlreadyCanceled);
        }

        let key = appointment.slot_key(&ctx.utc_offset);
        let scope = appointment.scope();

        appointment.status = AppointmentStatus::Canceled;
        let canceled = self.appointments.update(appointment).await?;

        match self
            .availability
            .release(ctx.tenant_id, key.date, scope, &key.label)
            .await
        {
            Ok(outcome) => debug!("Released {} {} after cancel: {:?}", key.date, key.label, outcome),
            Err(err) => error!(
                "Appointment {} canceled but slot {} {} was not returned: {}",
                canceled.id, key.date, key.label, err
            ),
        }

        info!("Canceled appointment {}", canceled.id);
        Ok(canceled)
    }
}

fn apply_updates(mut appointment: Appointment, request: &RescheduleAppointmentRequest) -> Appointment {
    if let Some(duration) = request.duration_minutes {
        appointment.duration_minutes = duration;
    }
    if let Some(price) = request.price {
        appointment.price = price;
    }
    if let Some(kind) = request.kind {
        appointment.kind = kind;
    }
    if let Some(address) = &request.address {
        appointment.address = Some(address.clone());
    }
    if let Some(method) = &request.payment_method {
        appointment.payment_method = Some(method.clone());
    }
    if let Some(payment_status) = request.payment_status {
        appointment.payment_status = payment_status;
    }
    if let Some(status) = request.status {
        appointment.status = status;
    }
    if let Some(notes) = &request.notes {
        appointment.notes = Some(notes.clone());
    }
    appointment
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn terminal_statuses_cannot_be_reopened() {
        assert!(validate_status_transition(AppointmentStatus::Scheduled, AppointmentStatus::Confirmed).is_ok());
        assert!(validate_status_transition(AppointmentStatus::NoShow, AppointmentStatus::Scheduled).is_ok());
        assert_matches!(
            validate_status_transition(AppointmentStatus::Completed, AppointmentStatus::Scheduled),
            Err(AppointmentError::InvalidStatusTransition { .. })
        );
    }

    #[test]
    fn cancel_is_not_an_update_transition() {
        for status in [AppointmentStatus::Scheduled, AppointmentStatus::Confirmed] {
            assert_matches!(
                validate_status_transition(status, AppointmentStatus::Canceled),
                Err(AppointmentError::InvalidStatusTransition { .. })
            );
        }
    }
}
