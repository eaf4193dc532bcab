use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    #[default]
    Active,
    Inactive,
}

/// Professionals are numbered per tenant, so `professional_id` alone is not unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Professional {
    pub professional_id: i64,
    pub tenant_id: Uuid,
    pub name: String,
    pub specialty: Option<String>,
    #[serde(default)]
    pub status: ResourceStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub room_id: i64,
    pub tenant_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub status: ResourceStatus,
}
