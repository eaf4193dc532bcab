use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use tenant_cell::TenantContext;

use crate::models::{
    AvailabilityError, AvailabilityRecord, AvailableDay, DayStatus, DaySlots, DefineDayRequest,
    SlotScope, UpdateSchedulingRequest,
};
use crate::services::store::AvailabilityStore;
use crate::slot::normalize_slots;

/// Admin-facing operations over a tenant's availability days.
#[derive(Clone)]
pub struct AvailabilityService {
    store: Arc<dyn AvailabilityStore>,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn AvailabilityStore>) -> Self {
        Self { store }
    }

    /// Creates the day if needed, then replaces its slots, state and scope.
    pub async fn define_day(
        &self,
        ctx: &TenantContext,
        request: DefineDayRequest,
    ) -> Result<AvailabilityRecord, AvailabilityError> {
        let slots = normalize_slots(&request.slots)?;
        let scope = SlotScope::new(request.professional_id, request.room_id);

        let mut record = self
            .store
            .find_or_create(ctx.tenant_id, request.date, scope)
            .await?;

        record.slots = slots;
        record.enabled_state = request.enabled_state;
        record.professional_id = scope.professional_id;
        record.room_id = scope.room_id;

        let saved = self.store.save(record).await?;
        info!(
            "Defined {} for tenant {}: {} slots, {}",
            saved.date,
            ctx.tenant_id,
            saved.slots.len(),
            saved.enabled_state
        );
        Ok(saved)
    }

    pub async fn list_upcoming(
        &self,
        ctx: &TenantContext,
        from: Option<NaiveDate>,
    ) -> Result<Vec<AvailabilityRecord>, AvailabilityError> {
        let from = from.unwrap_or_else(|| ctx.today());
        Ok(self.store.list_upcoming(ctx.tenant_id, from).await?)
    }

    /// Open days from `from` onwards that still have at least one free slot.
    pub async fn list_available_days(
        &self,
        ctx: &TenantContext,
        from: NaiveDate,
    ) -> Result<Vec<AvailableDay>, AvailabilityError> {
        let records = self.store.list_upcoming(ctx.tenant_id, from).await?;
        let days: Vec<AvailableDay> = records
            .iter()
            .filter(|r| r.is_bookable())
            .map(AvailableDay::from)
            .collect();
        debug!("{} available days for tenant {} from {}", days.len(), ctx.tenant_id, from);
        Ok(days)
    }

    pub async fn find_by_date(
        &self,
        ctx: &TenantContext,
        date: NaiveDate,
    ) -> Result<Option<AvailabilityRecord>, AvailabilityError> {
        Ok(self.store.find(ctx.tenant_id, date).await?)
    }

    /// An unsaved empty open day stands in for dates nobody defined yet.
    pub async fn day_or_placeholder(
        &self,
        ctx: &TenantContext,
        date: NaiveDate,
    ) -> Result<AvailabilityRecord, AvailabilityError> {
        Ok(self
            .find_by_date(ctx, date)
            .await?
            .unwrap_or_else(|| AvailabilityRecord::new(ctx.tenant_id, date, SlotScope::default())))
    }

    /// Slots of an open day; `None` for undefined or non-open days.
    pub async fn open_day_slots(
        &self,
        ctx: &TenantContext,
        date: NaiveDate,
    ) -> Result<Option<DaySlots>, AvailabilityError> {
        let slots = self
            .find_by_date(ctx, date)
            .await?
            .filter(|record| record.enabled_state == DayStatus::Open)
            .map(|record| DaySlots {
                date: record.date,
                total_slots: record.slots.len(),
                available_slots: record.slots,
            });
        Ok(slots)
    }

    pub async fn delete_by_date(
        &self,
        ctx: &TenantContext,
        date: NaiveDate,
    ) -> Result<(), AvailabilityError> {
        if !self.store.delete(ctx.tenant_id, date).await? {
            return Err(AvailabilityError::NotFound);
        }
        warn!("Cleared scheduling {} for tenant {}", date, ctx.tenant_id);
        Ok(())
    }

    pub async fn list_by_professional(
        &self,
        ctx: &TenantContext,
        professional_id: i64,
        room_id: Option<i64>,
        from: Option<NaiveDate>,
    ) -> Result<Vec<AvailabilityRecord>, AvailabilityError> {
        let from = from.unwrap_or_else(|| ctx.today());
        Ok(self
            .store
            .list_by_professional(ctx.tenant_id, professional_id, room_id, from)
            .await?)
    }

    pub async fn update_by_id(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        request: UpdateSchedulingRequest,
    ) -> Result<AvailabilityRecord, AvailabilityError> {
        let mut record = self
            .store
            .find_by_id(ctx.tenant_id, id)
            .await?
            .ok_or(AvailabilityError::NotFound)?;

        if let Some(date) = request.date.filter(|d| *d != record.date) {
            if self.store.find(ctx.tenant_id, date).await?.is_some() {
                return Err(AvailabilityError::Conflict(format!(
                    "A scheduling already exists for {}",
                    date
                )));
            }
            record.date = date;
        }
        if let Some(slots) = request.slots {
            record.slots = normalize_slots(&slots)?;
        }
        if let Some(state) = request.enabled_state {
            record.enabled_state = state;
        }
        if let Some(professional_id) = request.professional_id {
            record.professional_id = Some(professional_id);
        }
        if let Some(room_id) = request.room_id {
            record.room_id = Some(room_id);
        }
        record.updated_at = Utc::now();

        let saved = self.store.save(record).await?;
        info!("Updated scheduling {} for tenant {}", saved.id, ctx.tenant_id);
        Ok(saved)
    }
}
