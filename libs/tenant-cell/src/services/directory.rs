use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use reqwest::Method;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::error::StoreError;

use crate::models::Tenant;

/// Lookup of companies by id or public slug.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn find_by_id(&self, tenant_id: Uuid) -> Result<Option<Tenant>, StoreError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tenant>, StoreError>;

    /// Accepts either the company UUID or its slug.
    async fn resolve(&self, id_or_slug: &str) -> Result<Option<Tenant>, StoreError> {
        match Uuid::parse_str(id_or_slug.trim()) {
            Ok(tenant_id) => self.find_by_id(tenant_id).await,
            Err(_) => self.find_by_slug(id_or_slug.trim()).await,
        }
    }
}

pub struct SupabaseTenantDirectory {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseTenantDirectory {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    async fn first(&self, path: &str) -> Result<Option<Tenant>, StoreError> {
        let rows: Vec<Tenant> = self.supabase.request(Method::GET, path, None, None).await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl TenantDirectory for SupabaseTenantDirectory {
    async fn find_by_id(&self, tenant_id: Uuid) -> Result<Option<Tenant>, StoreError> {
        debug!("Fetching company {}", tenant_id);
        self.first(&format!("/rest/v1/companies?id=eq.{}&limit=1", tenant_id)).await
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tenant>, StoreError> {
        debug!("Fetching company by slug {}", slug);
        self.first(&format!(
            "/rest/v1/companies?slug=eq.{}&limit=1",
            urlencoding::encode(slug)
        ))
        .await
    }
}

#[derive(Default)]
pub struct InMemoryTenantDirectory {
    tenants: RwLock<HashMap<Uuid, Tenant>>,
}

impl InMemoryTenantDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, tenant: Tenant) {
        if let Ok(mut tenants) = self.tenants.write() {
            tenants.insert(tenant.id, tenant);
        }
    }

    fn read<T>(&self, f: impl FnOnce(&HashMap<Uuid, Tenant>) -> T) -> Result<T, StoreError> {
        self.tenants
            .read()
            .map(|tenants| f(&tenants))
            .map_err(|_| StoreError::Database("tenant directory lock poisoned".to_string()))
    }
}

#[async_trait]
impl TenantDirectory for InMemoryTenantDirectory {
    async fn find_by_id(&self, tenant_id: Uuid) -> Result<Option<Tenant>, StoreError> {
        self.read(|tenants| tenants.get(&tenant_id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tenant>, StoreError> {
        self.read(|tenants| tenants.values().find(|t| t.slug == slug).cloned())
    }
}
