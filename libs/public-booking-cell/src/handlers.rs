// libs/public-booking-cell/src/handlers.rs
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::models::{BookingConfirmation, CompanySummary, PublicBookingError, PublicBookingRequest};
use crate::services::PublicBookingService;

#[axum::debug_handler]
pub async fn company_info(
    State(service): State<PublicBookingService>,
    Path(company): Path<String>,
) -> Result<Json<Value>, PublicBookingError> {
    let profile = service.company_info(&company).await?;
    Ok(Json(json!({
        "status": "success",
        "company": profile,
    })))
}

#[axum::debug_handler]
pub async fn available_days(
    State(service): State<PublicBookingService>,
    Path(company): Path<String>,
) -> Result<Json<Value>, PublicBookingError> {
    let (ctx, days) = service.available_days(&company).await?;
    Ok(Json(json!({
        "status": "success",
        "company": CompanySummary::from(&ctx),
        "available_days": days,
    })))
}

#[axum::debug_handler]
pub async fn available_slots(
    State(service): State<PublicBookingService>,
    Path((company, date)): Path<(String, NaiveDate)>,
) -> Result<Json<Value>, PublicBookingError> {
    let (ctx, day) = service.available_slots(&company, date).await?;
    Ok(Json(json!({
        "status": "success",
        "company": CompanySummary::from(&ctx),
        "date": day.date,
        "available_slots": day.available_slots,
        "total_slots": day.total_slots,
    })))
}

#[axum::debug_handler]
pub async fn book(
    State(service): State<PublicBookingService>,
    Path(company): Path<String>,
    Json(request): Json<PublicBookingRequest>,
) -> Result<(StatusCode, Json<Value>), PublicBookingError> {
    let (ctx, appointment) = service.book(&company, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": "Appointment booked",
            "appointment": BookingConfirmation::new(&appointment, &ctx),
        })),
    ))
}
