use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;
use tenant_cell::{tenant_context_middleware, TenantResolver};

use crate::handlers;
use crate::services::AvailabilityService;

pub fn scheduling_routes(
    config: Arc<AppConfig>,
    service: AvailabilityService,
    resolver: TenantResolver,
) -> Router {
    Router::new()
        .route("/", get(handlers::list_upcoming).post(handlers::define_day))
        .route("/available", get(handlers::list_available_days))
        .route(
            "/professional/{professional_id}",
            get(handlers::list_by_professional),
        )
        .route("/records/{id}", put(handlers::update_record))
        .route("/{date}", get(handlers::get_day).delete(handlers::delete_day))
        .layer(middleware::from_fn_with_state(resolver, tenant_context_middleware))
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(service)
}
