use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::error::StoreError;

use crate::models::{Appointment, AppointmentStatus};

/// Resource whose calendar must not hold two live appointments at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookedResource {
    Professional(i64),
    Room(i64),
}

#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn insert(&self, appointment: Appointment) -> Result<Appointment, StoreError>;

    async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Appointment>, StoreError>;

    /// Full-document write of an existing appointment.
    async fn update(&self, appointment: Appointment) -> Result<Appointment, StoreError>;

    /// Newest first.
    async fn list(
        &self,
        tenant_id: Uuid,
        professional_id: Option<i64>,
    ) -> Result<Vec<Appointment>, StoreError>;

    /// Non-canceled appointments of `resource` starting exactly at `scheduled_at`.
    async fn find_active_at(
        &self,
        tenant_id: Uuid,
        resource: BookedResource,
        scheduled_at: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StoreError>;
}

pub struct SupabaseAppointmentStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseAppointmentStore {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(Arc::new(SupabaseClient::new(config)))
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    async fn write(
        &self,
        method: Method,
        path: &str,
        appointment: &Appointment,
    ) -> Result<Appointment, StoreError> {
        let body: Value = serde_json::to_value(appointment)?;
        let rows: Vec<Appointment> = self
            .supabase
            .request_with_headers(
                method,
                path,
                None,
                Some(body),
                Some(SupabaseClient::representation_headers(&[])),
            )
            .await?;
        rows.into_iter().next().ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn insert(&self, appointment: Appointment) -> Result<Appointment, StoreError> {
        debug!("Inserting appointment {}", appointment.id);
        self.write(Method::POST, "/rest/v1/appointments", &appointment)
            .await
    }

    async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let path = format!(
            "/rest/v1/appointments?tenant_id=eq.{}&id=eq.{}&limit=1",
            tenant_id, id
        );
        let rows: Vec<Appointment> = self.supabase.request(Method::GET, &path, None, None).await?;
        Ok(rows.into_iter().next())
    }

    async fn update(&self, appointment: Appointment) -> Result<Appointment, StoreError> {
        let path = format!(
            "/rest/v1/appointments?tenant_id=eq.{}&id=eq.{}",
            appointment.tenant_id, appointment.id
        );
        self.write(Method::PATCH, &path, &appointment).await
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        professional_id: Option<i64>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let mut path = format!("/rest/v1/appointments?tenant_id=eq.{}", tenant_id);
        if let Some(professional_id) = professional_id {
            path.push_str(&format!("&professional_id=eq.{}", professional_id));
        }
        path.push_str("&order=scheduled_at.desc");
        Ok(self.supabase.request(Method::GET, &path, None, None).await?)
    }

    async fn find_active_at(
        &self,
        tenant_id: Uuid,
        resource: BookedResource,
        scheduled_at: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let resource_filter = match resource {
            BookedResource::Professional(id) => format!("professional_id=eq.{}", id),
            BookedResource::Room(id) => format!("room_id=eq.{}", id),
        };
        let instant = scheduled_at.to_rfc3339_opts(SecondsFormat::Secs, true);
        let path = format!(
            "/rest/v1/appointments?tenant_id=eq.{}&{}&scheduled_at=eq.{}&status=neq.{}",
            tenant_id,
            resource_filter,
            urlencoding::encode(&instant),
            AppointmentStatus::Canceled
        );
        Ok(self.supabase.request(Method::GET, &path, None, None).await?)
    }
}

#[derive(Default)]
pub struct InMemoryAppointmentStore {
    appointments: RwLock<HashMap<Uuid, Appointment>>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StoreError {
        StoreError::Database("appointment store lock poisoned".to_string())
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn insert(&self, appointment: Appointment) -> Result<Appointment, StoreError> {
        let mut appointments = self.appointments.write().map_err(|_| Self::poisoned())?;
        if appointments.contains_key(&appointment.id) {
            return Err(StoreError::Conflict(format!(
                "Appointment {} already exists",
                appointment.id
            )));
        }
        appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let appointments = self.appointments.read().map_err(|_| Self::poisoned())?;
        Ok(appointments
            .get(&id)
            .filter(|a| a.tenant_id == tenant_id)
            .cloned())
    }

    async fn update(&self, mut appointment: Appointment) -> Result<Appointment, StoreError> {
        let mut appointments = self.appointments.write().map_err(|_| Self::poisoned())?;
        match appointments.get(&appointment.id) {
            Some(existing) if existing.tenant_id == appointment.tenant_id => {}
            _ => return Err(StoreError::NotFound),
        }
        appointment.updated_at = Utc::now();
        appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        professional_id: Option<i64>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let appointments = self.appointments.read().map_err(|_| Self::poisoned())?;
        let mut listed: Vec<Appointment> = appointments
            .values()
            .filter(|a| a.tenant_id == tenant_id)
            .filter(|a| professional_id.map_or(true, |p| a.professional_id == Some(p)))
            .cloned()
            .collect();
        listed.sort_by(|a, b| b.scheduled_at.cmp(&a.scheduled_at));
        Ok(listed)
    }

    async fn find_active_at(
        &self,
        tenant_id: Uuid,
        resource: BookedResource,
        scheduled_at: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let appointments = self.appointments.read().map_err(|_| Self::poisoned())?;
        Ok(appointments
            .values()
            .filter(|a| a.tenant_id == tenant_id && !a.is_canceled())
            .filter(|a| a.scheduled_at == scheduled_at)
            .filter(|a| match resource {
                BookedResource::Professional(id) => a.professional_id == Some(id),
                BookedResource::Room(id) => a.room_id == Some(id),
            })
            .cloned()
            .collect())
    }
}
