use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_models::error::{AppError, FieldErrors, StoreError};

/// Day state. Stored as a snake_case name; older rows carry the integer code.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    #[default]
    Open,
    Busy,
    Closed,
    Holiday,
}

impl DayStatus {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(DayStatus::Open),
            1 => Some(DayStatus::Busy),
            2 => Some(DayStatus::Closed),
            3 => Some(DayStatus::Holiday),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            DayStatus::Open => 0,
            DayStatus::Busy => 1,
            DayStatus::Closed => 2,
            DayStatus::Holiday => 3,
        }
    }
}

impl fmt::Display for DayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DayStatus::Open => "open",
            DayStatus::Busy => "busy",
            DayStatus::Closed => "closed",
            DayStatus::Holiday => "holiday",
        };
        f.write_str(name)
    }
}

impl FromStr for DayStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(DayStatus::Open),
            "busy" => Ok(DayStatus::Busy),
            "closed" => Ok(DayStatus::Closed),
            "holiday" => Ok(DayStatus::Holiday),
            other => other
                .parse::<i64>()
                .ok()
                .and_then(DayStatus::from_code)
                .ok_or_else(|| format!("unknown day status '{}'", s)),
        }
    }
}

impl<'de> Deserialize<'de> for DayStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Code(i64),
            Name(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Code(code) => DayStatus::from_code(code)
                .ok_or_else(|| de::Error::custom(format!("unknown day status code {}", code))),
            Repr::Name(name) => name.parse().map_err(de::Error::custom),
        }
    }
}

/// Professional/room a day of availability is bound to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotScope {
    pub professional_id: Option<i64>,
    pub room_id: Option<i64>,
}

impl SlotScope {
    pub fn new(professional_id: Option<i64>, room_id: Option<i64>) -> Self {
        Self {
            professional_id,
            room_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailabilityRecord {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub date: NaiveDate,
    /// Free slot labels ("HH:MM"). A missing label is booked or was never offered.
    #[serde(default)]
    pub slots: Vec<String>,
    #[serde(default, alias = "enabled")]
    pub enabled_state: DayStatus,
    pub professional_id: Option<i64>,
    pub room_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AvailabilityRecord {
    pub fn new(tenant_id: Uuid, date: NaiveDate, scope: SlotScope) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            date,
            slots: Vec::new(),
            enabled_state: DayStatus::Open,
            professional_id: scope.professional_id,
            room_id: scope.room_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn scope(&self) -> SlotScope {
        SlotScope::new(self.professional_id, self.room_id)
    }

    /// Unset scope fields on the record match any request.
    pub fn matches(&self, scope: &SlotScope) -> bool {
        let field_matches = |mine: Option<i64>, wanted: Option<i64>| match mine {
            None => true,
            Some(id) => wanted == Some(id),
        };
        field_matches(self.professional_id, scope.professional_id)
            && field_matches(self.room_id, scope.room_id)
    }

    pub fn has_slot(&self, label: &str) -> bool {
        self.slots.iter().any(|s| s == label)
    }

    pub fn is_open(&self) -> bool {
        self.enabled_state == DayStatus::Open
    }

    /// Offered on the public booking page.
    pub fn is_bookable(&self) -> bool {
        self.is_open() && !self.slots.is_empty()
    }
}

/// Result of handing a slot back. Callers treat every variant as success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseOutcome {
    Released,
    AlreadyPresent,
    RecordMissing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefineDayRequest {
    pub date: NaiveDate,
    #[serde(default)]
    pub slots: Vec<String>,
    #[serde(default, alias = "enabled")]
    pub enabled_state: DayStatus,
    pub professional_id: Option<i64>,
    pub room_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSchedulingRequest {
    pub date: Option<NaiveDate>,
    pub slots: Option<Vec<String>>,
    #[serde(alias = "enabled")]
    pub enabled_state: Option<DayStatus>,
    pub professional_id: Option<i64>,
    pub room_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailableDay {
    pub date: NaiveDate,
    pub slots: Vec<String>,
    pub available_slots: usize,
}

impl From<&AvailabilityRecord> for AvailableDay {
    fn from(record: &AvailabilityRecord) -> Self {
        Self {
            date: record.date,
            slots: record.slots.clone(),
            available_slots: record.slots.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DaySlots {
    pub date: NaiveDate,
    pub available_slots: Vec<String>,
    pub total_slots: usize,
}

#[derive(Debug, Error)]
pub enum AvailabilityError {
    #[error("Invalid slot labels: {}", .0.join(", "))]
    InvalidSlots(Vec<String>),

    #[error("Invalid date or time: {0}")]
    InvalidDateTime(String),

    #[error("Scheduling not found")]
    NotFound,

    #[error("Scheduling conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AvailabilityError> for AppError {
    fn from(error: AvailabilityError) -> Self {
        match error {
            AvailabilityError::InvalidSlots(labels) => {
                let mut details = FieldErrors::new();
                details.insert(
                    "slots".to_string(),
                    labels
                        .iter()
                        .map(|l| format!("'{}' is not a valid HH:MM slot", l))
                        .collect(),
                );
                AppError::ValidationError {
                    message: "Invalid slot labels".to_string(),
                    details,
                }
            }
            AvailabilityError::InvalidDateTime(msg) => AppError::validation(msg),
            AvailabilityError::NotFound => AppError::NotFound("Scheduling not found".to_string()),
            AvailabilityError::Conflict(msg) => AppError::Conflict(msg),
            AvailabilityError::Store(err) => err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn day_status_accepts_names_and_legacy_codes() {
        let from_code: DayStatus = serde_json::from_value(json!(3)).unwrap();
        assert_eq!(from_code, DayStatus::Holiday);

        let from_name: DayStatus = serde_json::from_value(json!("closed")).unwrap();
        assert_eq!(from_name, DayStatus::Closed);

        assert!(serde_json::from_value::<DayStatus>(json!(7)).is_err());
        assert_eq!(serde_json::to_value(DayStatus::Busy).unwrap(), json!("busy"));
    }

    #[test]
    fn unset_scope_matches_everything() {
        let tenant = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2025, 11, 26).unwrap();

        let open = AvailabilityRecord::new(tenant, date, SlotScope::default());
        assert!(open.matches(&SlotScope::new(Some(10), None)));
        assert!(open.matches(&SlotScope::default()));

        let bound = AvailabilityRecord::new(tenant, date, SlotScope::new(Some(10), None));
        assert!(bound.matches(&SlotScope::new(Some(10), Some(3))));
        assert!(!bound.matches(&SlotScope::new(Some(11), None)));
        assert!(!bound.matches(&SlotScope::default()));
    }

    #[test]
    fn define_day_request_accepts_enabled_alias() {
        let request: DefineDayRequest = serde_json::from_value(json!({
            "date": "2025-11-26",
            "slots": ["09:00"],
            "enabled": 2
        }))
        .unwrap();
        assert_eq!(request.enabled_state, DayStatus::Closed);
        assert_eq!(request.professional_id, None);
    }
}
