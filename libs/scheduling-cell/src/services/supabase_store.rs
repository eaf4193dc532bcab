use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::Method;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::error::StoreError;

use crate::models::{AvailabilityRecord, ReleaseOutcome, SlotScope};
use crate::services::store::AvailabilityStore;

const TABLE: &str = "/rest/v1/schedulings";

/// `schedulings` table behind PostgREST. Slot writes go through the
/// `reserve_slot` / `release_slot` functions in `supabase/migrations`.
pub struct SupabaseAvailabilityStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseAvailabilityStore {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(Arc::new(SupabaseClient::new(config)))
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    async fn first(&self, query: &str) -> Result<Option<AvailabilityRecord>, StoreError> {
        let rows = self.select(query).await?;
        Ok(rows.into_iter().next())
    }

    async fn select(&self, query: &str) -> Result<Vec<AvailabilityRecord>, StoreError> {
        let path = format!("{}?{}", TABLE, query);
        Ok(self.supabase.request(Method::GET, &path, None, None).await?)
    }

    fn slot_args(
        tenant_id: Uuid,
        date: NaiveDate,
        scope: SlotScope,
        slot: &str,
    ) -> serde_json::Value {
        json!({
            "p_tenant_id": tenant_id,
            "p_date": date,
            "p_slot": slot,
            "p_professional_id": scope.professional_id,
            "p_room_id": scope.room_id,
        })
    }
}

#[async_trait]
impl AvailabilityStore for SupabaseAvailabilityStore {
    async fn find(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<AvailabilityRecord>, StoreError> {
        self.first(&format!("tenant_id=eq.{}&date=eq.{}&limit=1", tenant_id, date))
            .await
    }

    async fn find_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<AvailabilityRecord>, StoreError> {
        self.first(&format!("tenant_id=eq.{}&id=eq.{}&limit=1", tenant_id, id))
            .await
    }

    async fn find_or_create(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
        scope: SlotScope,
    ) -> Result<AvailabilityRecord, StoreError> {
        if let Some(existing) = self.find(tenant_id, date).await? {
            return Ok(existing);
        }

        debug!("Creating scheduling for {} (tenant {})", date, tenant_id);
        let record = AvailabilityRecord::new(tenant_id, date, scope);
        let path = format!("{}?on_conflict=tenant_id,date", TABLE);
        let created: Vec<AvailabilityRecord> = self
            .supabase
            .request_with_headers(
                Method::POST,
                &path,
                None,
                Some(serde_json::to_value(&record)?),
                Some(SupabaseClient::representation_headers(&[
                    "resolution=ignore-duplicates",
                ])),
            )
            .await?;

        if let Some(record) = created.into_iter().next() {
            return Ok(record);
        }

        // Another request created the day between our read and insert
        self.find(tenant_id, date)
            .await?
            .ok_or_else(|| StoreError::Database(format!("Failed to create scheduling for {}", date)))
    }

    async fn save(&self, record: AvailabilityRecord) -> Result<AvailabilityRecord, StoreError> {
        let path = format!("{}?tenant_id=eq.{}&id=eq.{}", TABLE, record.tenant_id, record.id);
        let body = json!({
            "date": record.date,
            "slots": record.slots,
            "enabled_state": record.enabled_state,
            "professional_id": record.professional_id,
            "room_id": record.room_id,
            "updated_at": Utc::now(),
        });

        let updated: Vec<AvailabilityRecord> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                None,
                Some(body),
                Some(SupabaseClient::representation_headers(&[])),
            )
            .await
            .map_err(|e| {
                let message = e.to_string();
                if message.starts_with("Conflict") {
                    StoreError::Conflict(format!("A scheduling already exists for {}", record.date))
                } else {
                    StoreError::Database(message)
                }
            })?;

        updated.into_iter().next().ok_or(StoreError::NotFound)
    }

    async fn reserve(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
        scope: SlotScope,
        slot: &str,
    ) -> Result<bool, StoreError> {
        let reserved: bool = self
            .supabase
            .rpc("reserve_slot", Self::slot_args(tenant_id, date, scope, slot))
            .await?;
        debug!("reserve_slot {} {} -> {}", date, slot, reserved);
        Ok(reserved)
    }

    async fn release(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
        scope: SlotScope,
        slot: &str,
    ) -> Result<ReleaseOutcome, StoreError> {
        let outcome: ReleaseOutcome = self
            .supabase
            .rpc("release_slot", Self::slot_args(tenant_id, date, scope, slot))
            .await?;

        if outcome == ReleaseOutcome::RecordMissing {
            warn!(
                "No scheduling for {} to release {} into (tenant {})",
                date, slot, tenant_id
            );
        }
        Ok(outcome)
    }

    async fn list_upcoming(
        &self,
        tenant_id: Uuid,
        from: NaiveDate,
    ) -> Result<Vec<AvailabilityRecord>, StoreError> {
        self.select(&format!(
            "tenant_id=eq.{}&date=gte.{}&order=date.asc",
            tenant_id, from
        ))
        .await
    }

    async fn list_by_professional(
        &self,
        tenant_id: Uuid,
        professional_id: i64,
        room_id: Option<i64>,
        from: NaiveDate,
    ) -> Result<Vec<AvailabilityRecord>, StoreError> {
        let mut query = format!(
            "tenant_id=eq.{}&professional_id=eq.{}&date=gte.{}",
            tenant_id, professional_id, from
        );
        if let Some(room_id) = room_id {
            query.push_str(&format!("&room_id=eq.{}", room_id));
        }
        query.push_str("&order=date.asc");
        self.select(&query).await
    }

    async fn delete(&self, tenant_id: Uuid, date: NaiveDate) -> Result<bool, StoreError> {
        let path = format!("{}?tenant_id=eq.{}&date=eq.{}", TABLE, tenant_id, date);
        let removed: Vec<AvailabilityRecord> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                None,
                None,
                Some(SupabaseClient::representation_headers(&[])),
            )
            .await?;
        Ok(!removed.is_empty())
    }
}
