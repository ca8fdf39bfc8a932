use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    routing::get,
    Router,
};
use chrono::Utc;

use medstock_auth::Permission;

use crate::app::routes::common::respond;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::authorize_request;
use crate::context::OperatorContext;

pub fn router() -> Router {
    Router::new().route("/", get(list_movements))
}

/// Transaction history, newest first.
pub async fn list_movements(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(operator): Extension<OperatorContext>,
    Query(query): Query<dto::MovementQuery>,
) -> axum::response::Response {
    if let Err(e) = authorize_request(&operator, &Permission::MOVEMENTS_READ) {
        return errors::forbidden(e);
    }
    let filter = match query.into_filter(Utc::now()) {
        Ok(f) => f,
        Err(e) => return errors::domain_error_to_response(e),
    };
    respond(StatusCode::OK, services.movements.list(&filter).await)
}
