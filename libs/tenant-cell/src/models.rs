// libs/tenant-cell/src/models.rs
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TenantStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TenantPaymentStatus {
    #[default]
    Paid,
    Pending,
    Overdue,
}

/// A company using the clinic backend. Every record is partitioned by its id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub status: TenantStatus,
    #[serde(default)]
    pub payment_status: TenantPaymentStatus,
    pub utc_offset_minutes: Option<i32>,
}

impl Tenant {
    pub fn new(name: &str, slug: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slug.to_string(),
            email: None,
            phone: None,
            address: None,
            status: TenantStatus::Active,
            payment_status: TenantPaymentStatus::Paid,
            utc_offset_minutes: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == TenantStatus::Active
    }

    pub fn payment_overdue(&self) -> bool {
        self.payment_status == TenantPaymentStatus::Overdue
    }

    pub fn profile(&self) -> TenantProfile {
        TenantProfile {
            id: self.id,
            name: self.name.clone(),
            slug: self.slug.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            status: self.status,
        }
    }
}

/// Public view of a tenant, safe to expose on unauthenticated routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantProfile {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub status: TenantStatus,
}

/// The calling tenant as seen by booking operations.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub tenant_id: Uuid,
    pub name: String,
    pub slug: String,
    pub utc_offset: FixedOffset,
}

impl TenantContext {
    pub fn from_tenant(tenant: &Tenant, default_utc_offset_minutes: i32) -> Self {
        let minutes = tenant.utc_offset_minutes.unwrap_or(default_utc_offset_minutes);
        Self {
            tenant_id: tenant.id,
            name: tenant.name.clone(),
            slug: tenant.slug.clone(),
            utc_offset: offset_from_minutes(minutes),
        }
    }

    /// Calendar day in the tenant's zone.
    pub fn today(&self) -> NaiveDate {
        self.local_date(Utc::now())
    }

    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.utc_offset).date_naive()
    }
}

/// Out-of-range offsets collapse to UTC.
pub fn offset_from_minutes(minutes: i32) -> FixedOffset {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix())
}
