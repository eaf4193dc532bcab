use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use shared_models::error::StoreError;

use crate::models::{AvailabilityRecord, ReleaseOutcome, SlotScope};

/// Persistence for per-day availability. One record per (tenant, date).
///
/// `reserve` and `release` are the only writes allowed to race with bookings;
/// both must be a single conditional update against the stored record.
#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    async fn find(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<AvailabilityRecord>, StoreError>;

    async fn find_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<AvailabilityRecord>, StoreError>;

    async fn find_or_create(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
        scope: SlotScope,
    ) -> Result<AvailabilityRecord, StoreError>;

    /// Full-document write of an existing record. Fails with `Conflict` when the
    /// record's date is already used by another record of the tenant.
    async fn save(&self, record: AvailabilityRecord) -> Result<AvailabilityRecord, StoreError>;

    /// Removes `slot` from the matching record if it is still free.
    /// Exactly one of any number of concurrent callers sees `true`.
    async fn reserve(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
        scope: SlotScope,
        slot: &str,
    ) -> Result<bool, StoreError>;

    async fn release(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
        scope: SlotScope,
        slot: &str,
    ) -> Result<ReleaseOutcome, StoreError>;

    /// Records dated `from` onwards, ascending by date.
    async fn list_upcoming(
        &self,
        tenant_id: Uuid,
        from: NaiveDate,
    ) -> Result<Vec<AvailabilityRecord>, StoreError>;

    async fn list_by_professional(
        &self,
        tenant_id: Uuid,
        professional_id: i64,
        room_id: Option<i64>,
        from: NaiveDate,
    ) -> Result<Vec<AvailabilityRecord>, StoreError>;

    /// `true` when a record was removed.
    async fn delete(&self, tenant_id: Uuid, date: NaiveDate) -> Result<bool, StoreError>;
}
