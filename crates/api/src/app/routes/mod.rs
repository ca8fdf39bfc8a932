use axum::{
    routing::{get, post, put},
    Router,
};

pub mod auth;
pub mod cabinets;
pub mod catalog;
pub mod common;
pub mod movements;
pub mod reports;
pub mod stock;
pub mod system;

/// Unauthenticated endpoints.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/auth/login", post(auth::login))
}

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route(
            "/auth/operators",
            get(auth::list_operators).post(auth::register_operator),
        )
        .route("/auth/operators/:login/password", put(auth::reset_password))
        .nest("/medicines", catalog::medicines_router())
        .nest("/inputs", catalog::inputs_router())
        .nest("/residents", catalog::residents_router())
        .nest("/cabinets", cabinets::router())
        .nest("/stock", stock::router())
        .nest("/movements", movements::router())
        .nest("/reports", reports::router())
}
