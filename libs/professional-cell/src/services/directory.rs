use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use reqwest::Method;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::error::StoreError;

use crate::models::{Professional, Room};

#[async_trait]
pub trait ProfessionalDirectory: Send + Sync {
    async fn find_by_id(
        &self,
        tenant_id: Uuid,
        professional_id: i64,
    ) -> Result<Option<Professional>, StoreError>;
}

#[async_trait]
pub trait RoomDirectory: Send + Sync {
    async fn find_by_id(&self, tenant_id: Uuid, room_id: i64) -> Result<Option<Room>, StoreError>;
}

pub struct SupabaseProfessionalDirectory {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseProfessionalDirectory {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(Arc::new(SupabaseClient::new(config)))
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl ProfessionalDirectory for SupabaseProfessionalDirectory {
    async fn find_by_id(
        &self,
        tenant_id: Uuid,
        professional_id: i64,
    ) -> Result<Option<Professional>, StoreError> {
        debug!("Fetching professional {} for tenant {}", professional_id, tenant_id);
        let path = format!(
            "/rest/v1/professionals?tenant_id=eq.{}&professional_id=eq.{}&limit=1",
            tenant_id, professional_id
        );
        let rows: Vec<Professional> = self.supabase.request(Method::GET, &path, None, None).await?;
        Ok(rows.into_iter().next())
    }
}

pub struct SupabaseRoomDirectory {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseRoomDirectory {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(Arc::new(SupabaseClient::new(config)))
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl RoomDirectory for SupabaseRoomDirectory {
    async fn find_by_id(&self, tenant_id: Uuid, room_id: i64) -> Result<Option<Room>, StoreError> {
        debug!("Fetching room {} for tenant {}", room_id, tenant_id);
        let path = format!(
            "/rest/v1/rooms?tenant_id=eq.{}&room_id=eq.{}&limit=1",
            tenant_id, room_id
        );
        let rows: Vec<Room> = self.supabase.request(Method::GET, &path, None, None).await?;
        Ok(rows.into_iter().next())
    }
}

#[derive(Default)]
pub struct InMemoryProfessionalDirectory {
    professionals: RwLock<HashMap<(Uuid, i64), Professional>>,
}

impl InMemoryProfessionalDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, professional: Professional) {
        if let Ok(mut professionals) = self.professionals.write() {
            professionals.insert((professional.tenant_id, professional.professional_id), professional);
        }
    }
}

#[async_trait]
impl ProfessionalDirectory for InMemoryProfessionalDirectory {
    async fn find_by_id(
        &self,
        tenant_id: Uuid,
        professional_id: i64,
    ) -> Result<Option<Professional>, StoreError> {
        self.professionals
            .read()
            .map(|professionals| professionals.get(&(tenant_id, professional_id)).cloned())
            .map_err(|_| StoreError::Database("professional directory lock poisoned".to_string()))
    }
}

#[derive(Default)]
pub struct InMemoryRoomDirectory {
    rooms: RwLock<HashMap<(Uuid, i64), Room>>,
}

impl InMemoryRoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, room: Room) {
        if let Ok(mut rooms) = self.rooms.write() {
            rooms.insert((room.tenant_id, room.room_id), room);
        }
    }
}

#[async_trait]
impl RoomDirectory for InMemoryRoomDirectory {
    async fn find_by_id(&self, tenant_id: Uuid, room_id: i64) -> Result<Option<Room>, StoreError> {
        self.rooms
            .read()
            .map(|rooms| rooms.get(&(tenant_id, room_id)).cloned())
            .map_err(|_| StoreError::Database("room directory lock poisoned".to_string()))
    }
}
