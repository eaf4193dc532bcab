// libs/public-booking-cell/src/router.rs
use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::services::PublicBookingService;

pub fn public_booking_routes(service: PublicBookingService) -> Router {
    // No auth layer: companies are addressed by id or slug in the path
    Router::new()
        .route("/{company}/info", get(handlers::company_info))
        .route("/{company}/available-days", get(handlers::available_days))
        .route(
            "/{company}/available-slots/{date}",
            get(handlers::available_slots),
        )
        .route("/{company}/book", post(handlers::book))
        .with_state(service)
}
