// libs/appointment-cell/src/models.rs
use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use patient_cell::{Patient, PatientContact};
use scheduling_cell::{AvailabilityError, SlotKey, SlotScope};
use shared_models::error::{FieldErrors, StoreError};

// ==============================================================================
// APPOINTMENT
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentKind {
    #[default]
    Clinic,
    Home,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Refunded,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Confirmed,
    Completed,
    Canceled,
    NoShow,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Canceled => "canceled",
            AppointmentStatus::NoShow => "no_show",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub patient_id: Option<Uuid>,
    pub patient_name: String,
    pub patient_phone: String,
    pub patient_document: Option<String>,
    pub professional_id: Option<i64>,
    pub room_id: Option<i64>,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub price: f64,
    #[serde(default)]
    pub kind: AppointmentKind,
    pub address: Option<String>,
    pub payment_method: Option<String>,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// New appointment carrying a snapshot of the patient's contact data.
    pub fn new(
        tenant_id: Uuid,
        patient: &Patient,
        scheduled_at: DateTime<Utc>,
        scope: SlotScope,
        details: &AppointmentDetails,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            patient_id: Some(patient.id),
            patient_name: patient.name.clone(),
            patient_phone: patient.phone.clone().unwrap_or_default(),
            patient_document: patient.document.clone(),
            professional_id: scope.professional_id,
            room_id: scope.room_id,
            scheduled_at,
            duration_minutes: details.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES),
            price: details.price.unwrap_or(0.0),
            kind: details.kind,
            address: details.address.clone(),
            payment_method: details.payment_method.clone(),
            payment_status: PaymentStatus::Pending,
            status: AppointmentStatus::Scheduled,
            notes: details.notes.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_canceled(&self) -> bool {
        self.status == AppointmentStatus::Canceled
    }

    pub fn scope(&self) -> SlotScope {
        SlotScope::new(self.professional_id, self.room_id)
    }

    pub fn slot_key(&self, offset: &FixedOffset) -> SlotKey {
        SlotKey::from_instant(self.scheduled_at, offset)
    }

    /// Field-level checks applied before every write.
    pub fn validate(&self) -> Result<(), AppointmentError> {
        let mut details = FieldErrors::new();
        let mut fail = |field: &str, message: &str| {
            details
                .entry(field.to_string())
                .or_default()
                .push(message.to_string());
        };

        if self.patient_name.trim().is_empty() {
            fail("patient_name", "can't be blank");
        }
        if self.patient_phone.trim().is_empty() {
            fail("patient_phone", "can't be blank");
        }
        if !self.price.is_finite() || self.price < 0.0 {
            fail("price", "must be greater than or equal to 0");
        }
        if self.duration_minutes <= 0 {
            fail("duration_minutes", "must be greater than 0");
        }
        if self.kind == AppointmentKind::Home
            && self.address.as_deref().map_or(true, |a| a.trim().is_empty())
        {
            fail("address", "is required for home appointments");
        }

        if details.is_empty() {
            Ok(())
        } else {
            Err(AppointmentError::ValidationError {
                message: "Appointment is invalid".to_string(),
                details,
            })
        }
    }
}

pub const DEFAULT_DURATION_MINUTES: i32 = 60;

/// Descriptive fields of a booking that do not affect slot reservation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentDetails {
    #[serde(default, alias = "type")]
    pub kind: AppointmentKind,
    pub address: Option<String>,
    pub price: Option<f64>,
    pub payment_method: Option<String>,
    #[serde(alias = "duration")]
    pub duration_minutes: Option<i32>,
    pub notes: Option<String>,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAppointmentRequest {
    #[serde(alias = "appointment_date")]
    pub scheduled_at: String,
    pub patient_id: Option<String>,
    pub professional_id: Option<i64>,
    pub room_id: Option<i64>,
    #[serde(flatten)]
    pub details: AppointmentDetails,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RescheduleAppointmentRequest {
    #[serde(alias = "appointment_date")]
    pub scheduled_at: Option<String>,
    #[serde(alias = "duration")]
    pub duration_minutes: Option<i32>,
    pub price: Option<f64>,
    #[serde(alias = "type")]
    pub kind: Option<AppointmentKind>,
    pub address: Option<String>,
    pub payment_method: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentListQuery {
    pub professional_id: Option<i64>,
}

/// Who is booking. Public bookings may only take open days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingChannel {
    Staff,
    Public,
}

#[derive(Debug, Clone)]
pub enum PatientRef {
    /// Raw id as sent by the caller; blank or missing is a validation failure.
    Existing(Option<String>),
    /// Looked up by document then phone, registered when unknown.
    Contact(PatientContact),
}

#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub channel: BookingChannel,
    pub scheduled_at: String,
    pub patient: PatientRef,
    pub professional_id: Option<i64>,
    pub room_id: Option<i64>,
    pub details: AppointmentDetails,
}

impl BookingRequest {
    pub fn scope(&self) -> SlotScope {
        SlotScope::new(self.professional_id, self.room_id)
    }
}

impl From<CreateAppointmentRequest> for BookingRequest {
    fn from(request: CreateAppointmentRequest) -> Self {
        Self {
            channel: BookingChannel::Staff,
            scheduled_at: request.scheduled_at,
            patient: PatientRef::Existing(request.patient_id),
            professional_id: request.professional_id,
            room_id: request.room_id,
            details: request.details,
        }
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Conflict,
    ValidationError,
    TenantInactive,
    Internal,
}

impl ErrorKind {
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::ValidationError => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::TenantInactive => StatusCode::FORBIDDEN,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error("No agenda defined for {date}")]
    AgendaNotFound { date: NaiveDate },

    #[error("Slot {slot} on {date} is not available")]
    SlotUnavailable { date: NaiveDate, slot: String },

    #[error("Appointment not found")]
    NotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Professional not found")]
    ProfessionalNotFound,

    #[error("Room not found")]
    RoomNotFound,

    #[error("Professional already has an appointment at this time")]
    ProfessionalConflict,

    #[error("Room is already booked at this time")]
    RoomConflict,

    #[error("Appointment is already canceled")]
    AlreadyCanceled,

    #[error("Cannot change status from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("{message}")]
    ValidationError { message: String, details: FieldErrors },

    #[error("Booking left in an inconsistent state: {0}")]
    InconsistentState(String),

    #[error("Storage failure: {0}")]
    Store(#[from] StoreError),
}

impl AppointmentError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut details = FieldErrors::new();
        details.insert(field.to_string(), vec![message.clone()]);
        AppointmentError::ValidationError { message, details }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppointmentError::AgendaNotFound { .. }
            | AppointmentError::NotFound
            | AppointmentError::PatientNotFound
            | AppointmentError::ProfessionalNotFound
            | AppointmentError::RoomNotFound => ErrorKind::NotFound,
            AppointmentError::SlotUnavailable { .. }
            | AppointmentError::ProfessionalConflict
            | AppointmentError::RoomConflict
            | AppointmentError::AlreadyCanceled => ErrorKind::Conflict,
            AppointmentError::InvalidStatusTransition { .. }
            | AppointmentError::ValidationError { .. } => ErrorKind::ValidationError,
            AppointmentError::Store(StoreError::NotFound) => ErrorKind::NotFound,
            AppointmentError::InconsistentState(_) | AppointmentError::Store(_) => {
                ErrorKind::Internal
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.kind().status_code()
    }
}

impl From<AvailabilityError> for AppointmentError {
    fn from(error: AvailabilityError) -> Self {
        match error {
            AvailabilityError::InvalidDateTime(msg) => AppointmentError::validation("scheduled_at", msg),
            AvailabilityError::InvalidSlots(labels) => {
                AppointmentError::validation("scheduled_at", format!("invalid slot {}", labels.join(", ")))
            }
            AvailabilityError::NotFound => AppointmentError::Store(StoreError::NotFound),
            AvailabilityError::Conflict(msg) => AppointmentError::Store(StoreError::Conflict(msg)),
            AvailabilityError::Store(err) => AppointmentError::Store(err),
        }
    }
}

impl IntoResponse for AppointmentError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let kind = self.kind();

        let details = match &self {
            AppointmentError::ValidationError { details, .. } => details.clone(),
            _ => FieldErrors::new(),
        };

        if kind == ErrorKind::Internal {
            tracing::error!("Error: {}: {}", status, self);
        } else {
            tracing::warn!("Error: {}: {}", status, self);
        }

        let body = json!({
            "error": self.to_string(),
            "kind": kind,
            "details": details,
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patient_cell::PatientSource;

    fn patient() -> Patient {
        Patient::new(
            Uuid::new_v4(),
            &PatientContact {
                name: "Maria Souza".to_string(),
                phone: Some("11988887777".to_string()),
                document: Some("12345678909".to_string()),
                email: None,
            },
            PatientSource::Manual,
        )
    }

    #[test]
    fn new_appointment_snapshots_patient() {
        let patient = patient();
        let appointment = Appointment::new(
            patient.tenant_id,
            &patient,
            Utc::now(),
            SlotScope::new(Some(10), None),
            &AppointmentDetails::default(),
        );

        assert_eq!(appointment.patient_name, "Maria Souza");
        assert_eq!(appointment.patient_document.as_deref(), Some("12345678909"));
        assert_eq!(appointment.duration_minutes, 60);
        assert_eq!(appointment.status, AppointmentStatus::Scheduled);
        assert_eq!(appointment.payment_status, PaymentStatus::Pending);
        assert!(appointment.validate().is_ok());
    }

    #[test]
    fn home_visit_requires_address_and_positive_values() {
        let patient = patient();
        let details = AppointmentDetails {
            kind: AppointmentKind::Home,
            price: Some(-1.0),
            duration_minutes: Some(0),
            ..Default::default()
        };
        let appointment =
            Appointment::new(patient.tenant_id, &patient, Utc::now(), SlotScope::default(), &details);

        match appointment.validate() {
            Err(AppointmentError::ValidationError { details, .. }) => {
                assert!(details.contains_key("address"));
                assert!(details.contains_key("price"));
                assert!(details.contains_key("duration_minutes"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn error_kinds_map_to_statuses() {
        assert_eq!(AppointmentError::RoomConflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(AppointmentError::AlreadyCanceled.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppointmentError::validation("patient_id", "is required").kind(),
            ErrorKind::ValidationError
        );
        assert_eq!(
            AppointmentError::Store(StoreError::Database("down".into())).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn create_request_accepts_legacy_field_names() {
        let request: CreateAppointmentRequest = serde_json::from_value(json!({
            "appointment_date": "2025-11-26T10:00",
            "patient_id": "abc",
            "type": "home",
            "duration": 30,
            "price": 120.0
        }))
        .unwrap();

        assert_eq!(request.scheduled_at, "2025-11-26T10:00");
        assert_eq!(request.details.kind, AppointmentKind::Home);
        assert_eq!(request.details.duration_minutes, Some(30));
    }
}
