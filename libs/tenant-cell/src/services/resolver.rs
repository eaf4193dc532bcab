use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use shared_models::error::{AppError, StoreError};

use crate::models::{Tenant, TenantContext};
use crate::services::directory::TenantDirectory;

/// Turns directory lookups into `TenantContext`s with the deployment's default zone.
#[derive(Clone)]
pub struct TenantResolver {
    directory: Arc<dyn TenantDirectory>,
    default_utc_offset_minutes: i32,
}

impl TenantResolver {
    pub fn new(directory: Arc<dyn TenantDirectory>, default_utc_offset_minutes: i32) -> Self {
        Self {
            directory,
            default_utc_offset_minutes,
        }
    }

    pub fn context_for(&self, tenant: &Tenant) -> TenantContext {
        TenantContext::from_tenant(tenant, self.default_utc_offset_minutes)
    }

    pub async fn resolve(&self, id_or_slug: &str) -> Result<Option<Tenant>, StoreError> {
        debug!("Resolving tenant {}", id_or_slug);
        self.directory.resolve(id_or_slug).await
    }

    /// Context for an authenticated staff member's company.
    ///
    /// Rejects machine accounts, users without a company, and companies that are
    /// suspended or behind on payment.
    pub async fn staff_context(
        &self,
        role: Option<&str>,
        company_id: Option<&str>,
    ) -> Result<TenantContext, AppError> {
        if role == Some("machine") {
            return Err(AppError::Forbidden(
                "Machine users cannot access clinic data".to_string(),
            ));
        }

        let company_id = company_id
            .ok_or_else(|| AppError::Forbidden("User has no associated company".to_string()))?;
        let tenant_id = Uuid::parse_str(company_id)
            .map_err(|_| AppError::Forbidden("User has no associated company".to_string()))?;

        let tenant = self
            .directory
            .find_by_id(tenant_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Company not found".to_string()))?;

        if tenant.payment_overdue() {
            warn!("Blocking access for company {} with overdue payment", tenant.id);
            return Err(AppError::TenantInactive("Payment overdue. Access suspended.".to_string()));
        }

        if !tenant.is_active() {
            warn!("Blocking access for inactive company {}", tenant.id);
            return Err(AppError::TenantInactive("Company inactive or suspended".to_string()));
        }

        Ok(self.context_for(&tenant))
    }
}
