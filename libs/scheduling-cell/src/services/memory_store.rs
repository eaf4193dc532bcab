use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_models::error::StoreError;

use crate::models::{AvailabilityRecord, ReleaseOutcome, SlotScope};
use crate::services::store::AvailabilityStore;

type DayKey = (Uuid, NaiveDate);

/// Process-local store. Each reserve/release runs in one critical section.
#[derive(Default)]
pub struct InMemoryAvailabilityStore {
    records: Mutex<HashMap<DayKey, AvailabilityRecord>>,
}

impl InMemoryAvailabilityStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<DayKey, AvailabilityRecord>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Database("availability store lock poisoned".to_string()))
    }

    fn sorted(mut records: Vec<AvailabilityRecord>) -> Vec<AvailabilityRecord> {
        records.sort_by_key(|r| r.date);
        records
    }
}

#[async_trait]
impl AvailabilityStore for InMemoryAvailabilityStore {
    async fn find(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<AvailabilityRecord>, StoreError> {
        Ok(self.lock()?.get(&(tenant_id, date)).cloned())
    }

    async fn find_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<AvailabilityRecord>, StoreError> {
        Ok(self
            .lock()?
            .values()
            .find(|r| r.id == id && r.tenant_id == tenant_id)
            .cloned())
    }

    async fn find_or_create(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
        scope: SlotScope,
    ) -> Result<AvailabilityRecord, StoreError> {
        let mut records = self.lock()?;
        let record = records
            .entry((tenant_id, date))
            .or_insert_with(|| AvailabilityRecord::new(tenant_id, date, scope));
        Ok(record.clone())
    }

    async fn save(&self, mut record: AvailabilityRecord) -> Result<AvailabilityRecord, StoreError> {
        let mut records = self.lock()?;

        let previous_key = records
            .iter()
            .find(|(_, r)| r.id == record.id && r.tenant_id == record.tenant_id)
            .map(|(key, _)| *key)
            .ok_or(StoreError::NotFound)?;

        let key = (record.tenant_id, record.date);
        if key != previous_key && records.contains_key(&key) {
            return Err(StoreError::Conflict(format!(
                "A scheduling already exists for {}",
                record.date
            )));
        }

        records.remove(&previous_key);
        record.updated_at = Utc::now();
        records.insert(key, record.clone());
        Ok(record)
    }

    async fn reserve(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
        scope: SlotScope,
        slot: &str,
    ) -> Result<bool, StoreError> {
        let mut records = self.lock()?;

        let Some(record) = records.get_mut(&(tenant_id, date)) else {
            return Ok(false);
        };
        if !record.matches(&scope) {
            return Ok(false);
        }

        match record.slots.iter().position(|s| s == slot) {
            Some(index) => {
                record.slots.remove(index);
                record.updated_at = Utc::now();
                debug!("Reserved {} {} for tenant {}", date, slot, tenant_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn release(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
        scope: SlotScope,
        slot: &str,
    ) -> Result<ReleaseOutcome, StoreError> {
        let mut records = self.lock()?;

        let record = match records.get_mut(&(tenant_id, date)) {
            Some(record) if record.matches(&scope) => record,
            _ => {
                warn!(
                    "No scheduling for {} to release {} into (tenant {})",
                    date, slot, tenant_id
                );
                return Ok(ReleaseOutcome::RecordMissing);
            }
        };

        if record.has_slot(slot) {
            return Ok(ReleaseOutcome::AlreadyPresent);
        }

        record.slots.push(slot.to_string());
        record.updated_at = Utc::now();
        debug!("Released {} {} for tenant {}", date, slot, tenant_id);
        Ok(ReleaseOutcome::Released)
    }

    async fn list_upcoming(
        &self,
        tenant_id: Uuid,
        from: NaiveDate,
    ) -> Result<Vec<AvailabilityRecord>, StoreError> {
        let records = self
            .lock()?
            .values()
            .filter(|r| r.tenant_id == tenant_id && r.date >= from)
            .cloned()
            .collect();
        Ok(Self::sorted(records))
    }

    async fn list_by_professional(
        &self,
        tenant_id: Uuid,
        professional_id: i64,
        room_id: Option<i64>,
        from: NaiveDate,
    ) -> Result<Vec<AvailabilityRecord>, StoreError> {
        let records = self
            .lock()?
            .values()
            .filter(|r| {
                r.tenant_id == tenant_id
                    && r.date >= from
                    && r.professional_id == Some(professional_id)
                    && room_id.map_or(true, |room| r.room_id == Some(room))
            })
            .cloned()
            .collect();
        Ok(Self::sorted(records))
    }

    async fn delete(&self, tenant_id: Uuid, date: NaiveDate) -> Result<bool, StoreError> {
        Ok(self.lock()?.remove(&(tenant_id, date)).is_some())
    }
}
