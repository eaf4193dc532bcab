//! Tenant-local slot arithmetic.
//!
//! Slots are keyed by the tenant's calendar day and an "HH:MM" label, so every
//! instant has to be converted into the tenant's offset before it can be matched
//! against an availability record.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::models::AvailabilityError;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub date: NaiveDate,
    pub label: String,
}

impl SlotKey {
    pub fn from_instant(instant: DateTime<Utc>, offset: &FixedOffset) -> Self {
        let local = instant.with_timezone(offset);
        Self {
            date: local.date_naive(),
            label: local.format("%H:%M").to_string(),
        }
    }
}

/// Accepts RFC 3339 with an explicit offset, or a naive timestamp read in `offset`.
pub fn parse_scheduled_at(
    raw: &str,
    offset: &FixedOffset,
) -> Result<DateTime<Utc>, AvailabilityError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AvailabilityError::InvalidDateTime(
            "scheduled_at is required".to_string(),
        ));
    }

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Ok(with_offset.with_timezone(&Utc));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .ok_or_else(|| {
            AvailabilityError::InvalidDateTime(format!("'{}' is not a valid date and time", raw))
        })?;

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| AvailabilityError::InvalidDateTime(format!("'{}' is ambiguous", raw)))
}

/// Canonical "HH:MM" label, or `None` when `raw` is not a wall-clock minute.
pub fn canonical_label(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.len() != 5 || raw.as_bytes()[2] != b':' {
        return None;
    }
    NaiveTime::parse_from_str(raw, "%H:%M")
        .ok()
        .map(|time| time.format("%H:%M").to_string())
}

/// Validates and de-duplicates labels, keeping first-seen order.
pub fn normalize_slots(labels: &[String]) -> Result<Vec<String>, AvailabilityError> {
    let mut slots: Vec<String> = Vec::with_capacity(labels.len());
    let mut invalid = Vec::new();

    for raw in labels {
        match canonical_label(raw) {
            Some(label) if !slots.contains(&label) => slots.push(label),
            Some(_) => {}
            None => invalid.push(raw.clone()),
        }
    }

    if invalid.is_empty() {
        Ok(slots)
    } else {
        Err(AvailabilityError::InvalidSlots(invalid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn sao_paulo() -> FixedOffset {
        FixedOffset::west_opt(3 * 3600).unwrap()
    }

    #[test]
    fn naive_timestamps_are_tenant_local() {
        let instant = parse_scheduled_at("2025-11-26T10:00", &sao_paulo()).unwrap();
        assert_eq!(instant, Utc.with_ymd_and_hms(2025, 11, 26, 13, 0, 0).unwrap());

        let key = SlotKey::from_instant(instant, &sao_paulo());
        assert_eq!(key.date, NaiveDate::from_ymd_opt(2025, 11, 26).unwrap());
        assert_eq!(key.label, "10:00");
    }

    #[test]
    fn explicit_offset_is_converted_into_tenant_zone() {
        let instant = parse_scheduled_at("2025-11-27T01:30:00Z", &sao_paulo()).unwrap();
        let key = SlotKey::from_instant(instant, &sao_paulo());
        assert_eq!(key.date, NaiveDate::from_ymd_opt(2025, 11, 26).unwrap());
        assert_eq!(key.label, "22:30");
    }

    #[test]
    fn malformed_timestamps_are_rejected() {
        assert_matches!(
            parse_scheduled_at("tomorrow at ten", &sao_paulo()),
            Err(AvailabilityError::InvalidDateTime(_))
        );
        assert_matches!(
            parse_scheduled_at("  ", &sao_paulo()),
            Err(AvailabilityError::InvalidDateTime(_))
        );
    }

    #[test]
    fn slots_are_validated_and_deduplicated() {
        let labels = vec!["09:00".to_string(), "10:30".to_string(), "09:00".to_string()];
        assert_eq!(normalize_slots(&labels).unwrap(), vec!["09:00", "10:30"]);

        let bad = vec!["9:00".to_string(), "24:00".to_string(), "11:00".to_string()];
        assert_matches!(normalize_slots(&bad), Err(AvailabilityError::InvalidSlots(v)) if v.len() == 2);
    }
}
