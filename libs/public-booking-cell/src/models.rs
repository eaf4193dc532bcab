// libs/public-booking-cell/src/models.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use appointment_cell::{
    Appointment, AppointmentDetails, AppointmentError, AppointmentKind, BookingChannel,
    BookingRequest, ErrorKind, PatientRef,
};
use patient_cell::PatientContact;
use scheduling_cell::AvailabilityError;
use shared_models::error::{FieldErrors, StoreError};
use tenant_cell::TenantContext;

/// Form posted by a patient on the company's booking page.
#[derive(Debug, Clone, Deserialize)]
pub struct PublicBookingRequest {
    #[serde(alias = "appointment_date")]
    pub scheduled_at: String,
    #[serde(default)]
    pub patient_name: String,
    pub patient_phone: Option<String>,
    #[serde(alias = "patiente_document")]
    pub patient_document: Option<String>,
    pub patient_email: Option<String>,
    pub professional_id: Option<i64>,
    pub room_id: Option<i64>,
    #[serde(flatten)]
    pub details: AppointmentDetails,
}

impl From<PublicBookingRequest> for BookingRequest {
    fn from(request: PublicBookingRequest) -> Self {
        Self {
            channel: BookingChannel::Public,
            scheduled_at: request.scheduled_at,
            patient: PatientRef::Contact(PatientContact {
                name: request.patient_name,
                phone: request.patient_phone,
                document: request.patient_document,
                email: request.patient_email,
            }),
            professional_id: request.professional_id,
            room_id: request.room_id,
            details: request.details,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanySummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl From<&TenantContext> for CompanySummary {
    fn from(ctx: &TenantContext) -> Self {
        Self {
            id: ctx.tenant_id,
            name: ctx.name.clone(),
            slug: ctx.slug.clone(),
        }
    }
}

/// What the booking page shows once an appointment is made.
#[derive(Debug, Clone, Serialize)]
pub struct BookingConfirmation {
    pub id: Uuid,
    pub patient_name: String,
    pub scheduled_at: String,
    #[serde(rename = "type")]
    pub kind: AppointmentKind,
    pub address: Option<String>,
    pub price: f64,
}

impl BookingConfirmation {
    /// `scheduled_at` is rendered in the company's zone.
    pub fn new(appointment: &Appointment, ctx: &TenantContext) -> Self {
        Self {
            id: appointment.id,
            patient_name: appointment.patient_name.clone(),
            scheduled_at: appointment
                .scheduled_at
                .with_timezone(&ctx.utc_offset)
                .to_rfc3339(),
            kind: appointment.kind,
            address: appointment.address.clone(),
            price: appointment.price,
        }
    }
}

#[derive(Debug, Error)]
pub enum PublicBookingError {
    #[error("Company not found")]
    CompanyNotFound,

    #[error("Company inactive or suspended")]
    TenantInactive,

    #[error("No slots available on {date}")]
    NoSlotsOn { date: NaiveDate },

    #[error(transparent)]
    Booking(#[from] AppointmentError),

    #[error(transparent)]
    Availability(#[from] AvailabilityError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PublicBookingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PublicBookingError::CompanyNotFound | PublicBookingError::NoSlotsOn { .. } => {
                ErrorKind::NotFound
            }
            PublicBookingError::TenantInactive => ErrorKind::TenantInactive,
            PublicBookingError::Booking(err) => err.kind(),
            PublicBookingError::Availability(AvailabilityError::NotFound)
            | PublicBookingError::Store(StoreError::NotFound) => ErrorKind::NotFound,
            PublicBookingError::Availability(_) | PublicBookingError::Store(_) => {
                ErrorKind::Internal
            }
        }
    }
}

impl IntoResponse for PublicBookingError {
    fn into_response(self) -> Response {
        if let PublicBookingError::Booking(err) = self {
            return err.into_response();
        }

        let kind = self.kind();
        let status = kind.status_code();
        if kind == ErrorKind::Internal {
            tracing::error!("Error: {}: {}", status, self);
        } else {
            tracing::warn!("Error: {}: {}", status, self);
        }

        let mut body = json!({
            "error": self.to_string(),
            "kind": kind,
            "details": FieldErrors::new(),
        });
        if let PublicBookingError::NoSlotsOn { date } = &self {
            body["date"] = json!(date);
        }
        (status, Json(body)).into_response()
    }
}
