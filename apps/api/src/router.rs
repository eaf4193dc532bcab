use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::appointment_routes;
use public_booking_cell::public_booking_routes;
use scheduling_cell::scheduling_routes;
use shared_config::AppConfig;

use crate::services::Services;

pub fn create_router(config: Arc<AppConfig>, services: Services) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic scheduling API is running!" }))
        .nest(
            "/appointments",
            appointment_routes(
                Arc::clone(&config),
                services.engine,
                services.resolver.clone(),
            ),
        )
        .nest(
            "/schedulings",
            scheduling_routes(config, services.availability, services.resolver),
        )
        .nest("/public/booking", public_booking_routes(services.public_booking))
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use shared_utils::test_utils::TestConfig;

    fn app() -> Router {
        let config = TestConfig::default().to_arc();
        let services = Services::from_config(&config);
        create_router(config, services)
    }

    #[tokio::test]
    async fn liveness_route_answers() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("running"));
    }

    #[tokio::test]
    async fn clinic_routes_need_a_token() {
        for uri in ["/appointments", "/schedulings"] {
            let response = app()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }

    #[tokio::test]
    async fn public_routes_are_open() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/public/booking/unknown-clinic/info")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["kind"], "not_found");
    }
}
