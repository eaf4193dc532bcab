use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;
use tenant_cell::TenantContext;

use crate::models::{DefineDayRequest, UpdateSchedulingRequest};
use crate::services::AvailabilityService;

#[derive(Debug, Deserialize)]
pub struct FromQuery {
    pub from: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ProfessionalQuery {
    pub room_id: Option<i64>,
    pub from: Option<NaiveDate>,
}

#[axum::debug_handler]
pub async fn define_day(
    State(service): State<AvailabilityService>,
    Extension(ctx): Extension<TenantContext>,
    Json(request): Json<DefineDayRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let record = service.define_day(&ctx, request).await?;
    Ok((StatusCode::CREATED, Json(json!(record))))
}

#[axum::debug_handler]
pub async fn list_upcoming(
    State(service): State<AvailabilityService>,
    Extension(ctx): Extension<TenantContext>,
    Query(query): Query<FromQuery>,
) -> Result<Json<Value>, AppError> {
    let schedulings = service.list_upcoming(&ctx, query.from).await?;
    Ok(Json(json!({
        "total": schedulings.len(),
        "schedulings": schedulings,
    })))
}

#[axum::debug_handler]
pub async fn list_available_days(
    State(service): State<AvailabilityService>,
    Extension(ctx): Extension<TenantContext>,
    Query(query): Query<FromQuery>,
) -> Result<Json<Value>, AppError> {
    let from = query.from.unwrap_or_else(|| ctx.today());
    let days = service.list_available_days(&ctx, from).await?;
    Ok(Json(json!({
        "total": days.len(),
        "days": days,
    })))
}

#[axum::debug_handler]
pub async fn get_day(
    State(service): State<AvailabilityService>,
    Extension(ctx): Extension<TenantContext>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<Value>, AppError> {
    let record = service.day_or_placeholder(&ctx, date).await?;
    Ok(Json(json!(record)))
}

#[axum::debug_handler]
pub async fn delete_day(
    State(service): State<AvailabilityService>,
    Extension(ctx): Extension<TenantContext>,
    Path(date): Path<NaiveDate>,
) -> Result<StatusCode, AppError> {
    service.delete_by_date(&ctx, date).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn list_by_professional(
    State(service): State<AvailabilityService>,
    Extension(ctx): Extension<TenantContext>,
    Path(professional_id): Path<i64>,
    Query(query): Query<ProfessionalQuery>,
) -> Result<Json<Value>, AppError> {
    let schedulings = service
        .list_by_professional(&ctx, professional_id, query.room_id, query.from)
        .await?;
    Ok(Json(json!({
        "total": schedulings.len(),
        "schedulings": schedulings,
    })))
}

#[axum::debug_handler]
pub async fn update_record(
    State(service): State<AvailabilityService>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateSchedulingRequest>,
) -> Result<Json<Value>, AppError> {
    let record = service.update_by_id(&ctx, id, request).await?;
    Ok(Json(json!(record)))
}
