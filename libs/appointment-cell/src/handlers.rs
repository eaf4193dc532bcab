// libs/appointment-cell/src/handlers.rs
use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use tenant_cell::TenantContext;

use crate::models::{
    AppointmentError, AppointmentListQuery, CreateAppointmentRequest, RescheduleAppointmentRequest,
};
use crate::services::BookingEngine;

// ==============================================================================
// STAFF APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_appointment(
    State(engine): State<BookingEngine>,
    Extension(ctx): Extension<TenantContext>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppointmentError> {
    let appointment = engine.create_appointment(&ctx, request).await?;
    Ok((StatusCode::CREATED, Json(json!(appointment))))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(engine): State<BookingEngine>,
    Extension(ctx): Extension<TenantContext>,
    Query(query): Query<AppointmentListQuery>,
) -> Result<Json<Value>, AppointmentError> {
    let appointments = engine.list_appointments(&ctx, query.professional_id).await?;
    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len(),
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(engine): State<BookingEngine>,
    Extension(ctx): Extension<TenantContext>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppointmentError> {
    let appointment = engine.get_appointment(&ctx, appointment_id).await?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(engine): State<BookingEngine>,
    Extension(ctx): Extension<TenantContext>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<RescheduleAppointmentRequest>,
) -> Result<Json<Value>, AppointmentError> {
    let appointment = engine
        .reschedule_appointment(&ctx, appointment_id, request)
        .await?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(engine): State<BookingEngine>,
    Extension(ctx): Extension<TenantContext>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppointmentError> {
    let appointment = engine.cancel_appointment(&ctx, appointment_id).await?;
    Ok(Json(json!(appointment)))
}
