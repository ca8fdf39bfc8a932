//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: the service bundle shared by all handlers
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and query-string mapping
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};

use medstock_auth::{Hs256Jwt, JwtValidator};
use medstock_infra::StockSettings;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<AppServices>) -> Router {
    let jwt: Arc<dyn JwtValidator> = services.jwt.clone();
    let auth_state = middleware::AuthState { jwt };

    // Protected routes: require a valid bearer token.
    let protected = routes::router()
        .layer(Extension(services.clone()))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    routes::public_router()
        .layer(Extension(services))
        .merge(protected)
}

/// Router over a fresh in-memory store.
pub fn build_in_memory_app(jwt_secret: &str) -> Router {
    let jwt = Arc::new(Hs256Jwt::new(jwt_secret, chrono::Duration::minutes(60)));
    let services = AppServices::in_memory(jwt, StockSettings::default());
    build_app(Arc::new(services))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_is_public() {
        let app = build_in_memory_app("unit-test-secret");
        let res = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_routes_reject_missing_token() {
        let app = build_in_memory_app("unit-test-secret");
        let res = app
            .oneshot(Request::get("/stock").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_with_unknown_operator_is_unauthorized() {
        let app = build_in_memory_app("unit-test-secret");
        let req = Request::post("/auth/login")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"login":"nobody","password":"whatever"}"#))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
