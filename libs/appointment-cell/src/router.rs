// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;
use tenant_cell::{tenant_context_middleware, TenantResolver};

use crate::handlers;
use crate::services::BookingEngine;

pub fn appointment_routes(
    config: Arc<AppConfig>,
    engine: BookingEngine,
    resolver: TenantResolver,
) -> Router {
    // Staff only: every route needs a JWT tied to an active company
    Router::new()
        .route(
            "/",
            get(handlers::list_appointments).post(handlers::create_appointment),
        )
        .route(
            "/{appointment_id}",
            get(handlers::get_appointment)
                .put(handlers::reschedule_appointment)
                .delete(handlers::cancel_appointment),
        )
        .layer(middleware::from_fn_with_state(resolver, tenant_context_middleware))
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(engine)
}
