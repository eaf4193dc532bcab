use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PatientSource {
    #[default]
    Manual,
    OnlineBooking,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    /// CPF, digits only.
    pub document: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub source: PatientSource,
    pub created_at: DateTime<Utc>,
}

impl Patient {
    pub fn new(tenant_id: Uuid, contact: &PatientContact, source: PatientSource) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            name: contact.name.trim().to_string(),
            phone: contact.phone_value(),
            document: contact.document_digits(),
            email: contact.email.clone().filter(|e| !e.trim().is_empty()),
            source,
            created_at: Utc::now(),
        }
    }
}

/// Contact details supplied by someone booking without a patient id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientContact {
    pub name: String,
    pub phone: Option<String>,
    pub document: Option<String>,
    pub email: Option<String>,
}

impl PatientContact {
    pub fn document_digits(&self) -> Option<String> {
        self.document.as_deref().and_then(normalize_document)
    }

    pub fn phone_value(&self) -> Option<String> {
        self.phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
    }
}

/// Strips CPF punctuation. `None` when no digits remain.
pub fn normalize_document(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_is_normalized_to_digits() {
        assert_eq!(normalize_document("123.456.789-09").as_deref(), Some("12345678909"));
        assert_eq!(normalize_document("N/A"), None);
        assert_eq!(normalize_document(""), None);
    }

    #[test]
    fn new_patient_drops_blank_contact_fields() {
        let contact = PatientContact {
            name: "  Maria Souza ".to_string(),
            phone: Some("   ".to_string()),
            document: Some("123.456.789-09".to_string()),
            email: Some(String::new()),
        };
        let patient = Patient::new(Uuid::new_v4(), &contact, PatientSource::OnlineBooking);

        assert_eq!(patient.name, "Maria Souza");
        assert_eq!(patient.phone, None);
        assert_eq!(patient.document.as_deref(), Some("12345678909"));
        assert_eq!(patient.email, None);
        assert_eq!(patient.source, PatientSource::OnlineBooking);
    }
}
