use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use tracing::info;

use medstock_auth::{AuthError, OperatorDraft, Permission};
use medstock_infra::ServiceError;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::OperatorContext;

/// Exchange a login/password pair for a bearer token.
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoginRequest>,
) -> axum::response::Response {
    let operator = match services
        .operators
        .authenticate(&body.login, &body.password)
        .await
    {
        Ok(op) => op,
        Err(e) => return errors::service_error_to_response(e),
    };

    let issued = services.jwt.issue(
        operator.id,
        &operator.login,
        vec![operator.role.clone()],
        Utc::now(),
    );
    let (token, claims) = match issued {
        Ok(v) => v,
        Err(e) => return errors::service_error_to_response(ServiceError::Auth(AuthError::Token(e))),
    };

    info!(operator_id = %operator.id, "operator logged in");
    (
        StatusCode::OK,
        Json(dto::LoginResponse {
            token,
            expires_at: claims.expires_at,
            operator,
        }),
    )
        .into_response()
}

pub async fn register_operator(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<OperatorContext>,
    Json(body): Json<OperatorDraft>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_request(&caller, &Permission::OPERATORS_MANAGE) {
        return errors::forbidden(e);
    }

    match services.operators.register(body).await {
        Ok(operator) => (StatusCode::CREATED, Json(operator)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_operators(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<OperatorContext>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_request(&caller, &Permission::OPERATORS_MANAGE) {
        return errors::forbidden(e);
    }

    match services.operators.list().await {
        Ok(operators) => (StatusCode::OK, Json(operators)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Admin-only password reset for a forgotten password.
pub async fn reset_password(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<OperatorContext>,
    Path(login): Path<String>,
    Json(body): Json<dto::ResetPasswordRequest>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_request(&caller, &Permission::OPERATORS_MANAGE) {
        return errors::forbidden(e);
    }

    match services.operators.reset_password(&login, &body.password).await {
        Ok(operator) => {
            info!(operator_id = %operator.id, reset_by = %caller.operator_id(), "password reset");
            (StatusCode::OK, Json(operator)).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}
