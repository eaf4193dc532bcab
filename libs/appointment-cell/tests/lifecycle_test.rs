mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use appointment_cell::{
    Appointment, AppointmentError, AppointmentStatus, AppointmentStore, BookedResource, ErrorKind,
    InMemoryAppointmentStore, RescheduleAppointmentRequest,
};
use scheduling_cell::{AvailabilityStore, SlotScope};
use shared_models::error::StoreError;

use common::{day, Harness, DAY};

fn at(label: &str) -> String {
    format!("{}T{}", DAY, label)
}

fn move_to(label: &str) -> RescheduleAppointmentRequest {
    RescheduleAppointmentRequest {
        scheduled_at: Some(at(label)),
        ..Default::default()
    }
}

async fn booked(harness: &Harness, label: &str) -> Appointment {
    harness
        .engine
        .create_appointment(&harness.ctx, harness.request(&at(label)))
        .await
        .unwrap()
}

/// Delegates to the in-memory store but can be told to fail updates. When a
/// competitor is set it grabs the 09:00 slot right before failing.
#[derive(Default)]
struct FailingUpdates {
    inner: InMemoryAppointmentStore,
    fail: AtomicBool,
    competitor: Mutex<Option<Arc<dyn AvailabilityStore>>>,
}

#[async_trait]
impl AppointmentStore for FailingUpdates {
    async fn insert(&self, appointment: Appointment) -> Result<Appointment, StoreError> {
        self.inner.insert(appointment).await
    }

    async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        self.inner.find(tenant_id, id).await
    }

    async fn update(&self, appointment: Appointment) -> Result<Appointment, StoreError> {
        if !self.fail.load(Ordering::SeqCst) {
            return self.inner.update(appointment).await;
        }
        let competitor = self.competitor.lock().unwrap().clone();
        if let Some(availability) = competitor {
            availability
                .reserve(appointment.tenant_id, day(), SlotScope::default(), "09:00")
                .await?;
        }
        Err(StoreError::Database("statement timeout".to_string()))
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        professional_id: Option<i64>,
    ) -> Result<Vec<Appointment>, StoreError> {
        self.inner.list(tenant_id, professional_id).await
    }

    async fn find_active_at(
        &self,
        tenant_id: Uuid,
        resource: BookedResource,
        scheduled_at: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StoreError> {
        self.inner.find_active_at(tenant_id, resource, scheduled_at).await
    }
}

#[tokio::test]
async fn test_reschedule_swaps_slots() {
    let harness = Harness::new();
    harness.open_day(day(), &["09:00", "10:00"], SlotScope::default()).await;
    let appointment = booked(&harness, "09:00").await;

    let moved = harness
        .engine
        .reschedule_appointment(&harness.ctx, appointment.id, move_to("10:00"))
        .await
        .unwrap();

    assert_eq!(moved.scheduled_at, appointment.scheduled_at + Duration::hours(1));
    assert_eq!(harness.free_slots(day()).await, vec!["09:00"]);
}

#[tokio::test]
async fn test_same_slot_reschedule_only_updates_fields() {
    let harness = Harness::new();
    harness.open_day(day(), &["09:00", "10:00"], SlotScope::default()).await;
    let appointment = booked(&harness, "09:00").await;

    let request = RescheduleAppointmentRequest {
        scheduled_at: Some(at("09:00")),
        notes: Some("Trazer exames".to_string()),
        status: Some(AppointmentStatus::Confirmed),
        ..Default::default()
    };
    let updated = harness
        .engine
        .reschedule_appointment(&harness.ctx, appointment.id, request)
        .await
        .unwrap();

    assert_eq!(updated.notes.as_deref(), Some("Trazer exames"));
    assert_eq!(updated.status, AppointmentStatus::Confirmed);
    assert_eq!(updated.scheduled_at, appointment.scheduled_at);
    assert_eq!(harness.free_slots(day()).await, vec!["10:00"]);
}

#[tokio::test]
async fn test_reschedule_onto_taken_slot_keeps_original() {
    let harness = Harness::new();
    harness.open_day(day(), &["09:00", "10:00"], SlotScope::default()).await;
    let first = booked(&harness, "09:00").await;
    booked(&harness, "10:00").await;

    let result = harness
        .engine
        .reschedule_appointment(&harness.ctx, first.id, move_to("10:00"))
        .await;

    assert_matches!(result, Err(AppointmentError::SlotUnavailable { .. }));
    assert!(harness.free_slots(day()).await.is_empty());
    let unchanged = harness.engine.get_appointment(&harness.ctx, first.id).await.unwrap();
    assert_eq!(unchanged.scheduled_at, first.scheduled_at);
}

#[tokio::test]
async fn test_reschedule_to_day_without_agenda() {
    let harness = Harness::new();
    harness.open_day(day(), &["09:00"], SlotScope::default()).await;
    let appointment = booked(&harness, "09:00").await;

    let request = RescheduleAppointmentRequest {
        scheduled_at: Some("2099-03-11T09:00".to_string()),
        ..Default::default()
    };
    let result = harness
        .engine
        .reschedule_appointment(&harness.ctx, appointment.id, request)
        .await;

    assert_matches!(result, Err(AppointmentError::AgendaNotFound { .. }));
    assert!(harness.free_slots(day()).await.is_empty());
}

#[tokio::test]
async fn test_invalid_status_transition_is_rejected() {
    let harness = Harness::new();
    harness.open_day(day(), &["09:00"], SlotScope::default()).await;
    let appointment = booked(&harness, "09:00").await;

    let complete = RescheduleAppointmentRequest {
        status: Some(AppointmentStatus::Completed),
        ..Default::default()
    };
    harness
        .engine
        .reschedule_appointment(&harness.ctx, appointment.id, complete)
        .await
        .unwrap();

    let reopen = RescheduleAppointmentRequest {
        status: Some(AppointmentStatus::Scheduled),
        ..Default::default()
    };
    let result = harness
        .engine
        .reschedule_appointment(&harness.ctx, appointment.id, reopen)
        .await;

    assert_matches!(
        result,
        Err(AppointmentError::InvalidStatusTransition {
            from: AppointmentStatus::Completed,
            to: AppointmentStatus::Scheduled
        })
    );
}

#[tokio::test]
async fn test_failed_reschedule_restores_original_slot() {
    let store = Arc::new(FailingUpdates::default());
    let harness = Harness::with_appointment_store(store.clone());
    harness.open_day(day(), &["09:00", "10:00"], SlotScope::default()).await;
    let appointment = booked(&harness, "09:00").await;

    store.fail.store(true, Ordering::SeqCst);
    let result = harness
        .engine
        .reschedule_appointment(&harness.ctx, appointment.id, move_to("10:00"))
        .await;

    assert_matches!(result, Err(AppointmentError::Store(StoreError::Database(_))));
    assert_eq!(harness.free_slots(day()).await, vec!["10:00"]);
    let unchanged = harness.engine.get_appointment(&harness.ctx, appointment.id).await.unwrap();
    assert_eq!(unchanged.scheduled_at, appointment.scheduled_at);
}

#[tokio::test]
async fn test_failed_reschedule_reports_lost_original_slot() {
    let store = Arc::new(FailingUpdates::default());
    let harness = Harness::with_appointment_store(store.clone());
    harness.open_day(day(), &["09:00", "10:00"], SlotScope::default()).await;
    let appointment = booked(&harness, "09:00").await;

    *store.competitor.lock().unwrap() = Some(harness.availability.clone());
    store.fail.store(true, Ordering::SeqCst);
    let result = harness
        .engine
        .reschedule_appointment(&harness.ctx, appointment.id, move_to("10:00"))
        .await;

    let err = result.unwrap_err();
    assert_matches!(err, AppointmentError::InconsistentState(_));
    assert_eq!(err.kind(), ErrorKind::Internal);
    // The new slot is still handed back even though the old one is gone.
    assert_eq!(harness.free_slots(day()).await, vec!["10:00"]);
}

#[tokio::test]
async fn test_cancel_returns_the_slot() {
    let harness = Harness::new();
    harness.open_day(day(), &["09:00", "10:00"], SlotScope::default()).await;
    let appointment = booked(&harness, "09:00").await;

    let canceled = harness
        .engine
        .cancel_appointment(&harness.ctx, appointment.id)
        .await
        .unwrap();

    assert_eq!(canceled.status, AppointmentStatus::Canceled);
    assert_eq!(harness.free_slots(day()).await, vec!["10:00", "09:00"]);

    // Someone else can take it now.
    booked(&harness, "09:00").await;
}

#[tokio::test]
async fn test_cancel_twice_and_reschedule_after_cancel() {
    let harness = Harness::new();
    harness.open_day(day(), &["09:00", "10:00"], SlotScope::default()).await;
    let appointment = booked(&harness, "09:00").await;
    harness
        .engine
        .cancel_appointment(&harness.ctx, appointment.id)
        .await
        .unwrap();

    assert_matches!(
        harness.engine.cancel_appointment(&harness.ctx, appointment.id).await,
        Err(AppointmentError::AlreadyCanceled)
    );
    assert_matches!(
        harness
            .engine
            .reschedule_appointment(&harness.ctx, appointment.id, move_to("10:00"))
            .await,
        Err(AppointmentError::AlreadyCanceled)
    );
    assert_eq!(harness.free_slots(day()).await, vec!["10:00", "09:00"]);
}

#[tokio::test]
async fn test_cancel_unknown_appointment() {
    let harness = Harness::new();

    assert_matches!(
        harness.engine.cancel_appointment(&harness.ctx, Uuid::new_v4()).await,
        Err(AppointmentError::NotFound)
    );
}

#[tokio::test]
async fn test_cancel_survives_cleared_day() {
    let harness = Harness::new();
    harness.open_day(day(), &["09:00"], SlotScope::default()).await;
    let appointment = booked(&harness, "09:00").await;
    harness
        .availability
        .delete(harness.ctx.tenant_id, day())
        .await
        .unwrap();

    let canceled = harness
        .engine
        .cancel_appointment(&harness.ctx, appointment.id)
        .await
        .unwrap();

    assert_eq!(canceled.status, AppointmentStatus::Canceled);
    assert!(harness
        .availability
        .find(harness.ctx.tenant_id, day())
        .await
        .unwrap()
        .is_none());
}
