use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::error;

use medstock_auth::{AuthError, AuthzError};
use medstock_core::DomainError;
use medstock_infra::ServiceError;
use medstock_report::ReportError;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Domain(e) => domain_error_to_response(e),
        ServiceError::Auth(AuthError::InvalidCredentials) => json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "invalid login or password",
        ),
        ServiceError::Auth(AuthError::Token(e)) => {
            json_error(StatusCode::UNAUTHORIZED, "invalid_token", e.to_string())
        }
        ServiceError::Auth(e @ AuthError::Hashing(_)) => {
            error!(error = %e, "password hashing failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "auth_error", e.to_string())
        }
        ServiceError::Store(e) => {
            error!(error = %e, "store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let status = match &err {
        DomainError::Validation(_)
        | DomainError::InvalidQuantity(_)
        | DomainError::InvalidAssociation(_)
        | DomainError::InvalidId(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound(_) | DomainError::UnknownReference(_) => StatusCode::NOT_FOUND,
        DomainError::DuplicateCatalogKey(_)
        | DomainError::InUse(_)
        | DomainError::InsufficientStock { .. }
        | DomainError::DestinationsRequired { .. }
        | DomainError::Conflict(_)
        | DomainError::QuantityOverflow(_)
        | DomainError::RelocationIncomplete(_) => StatusCode::CONFLICT,
        DomainError::Unauthorized => StatusCode::FORBIDDEN,
    };
    json_error(status, err.code(), err.to_string())
}

pub fn forbidden(err: AuthzError) -> axum::response::Response {
    json_error(StatusCode::FORBIDDEN, "forbidden", err.to_string())
}

pub fn report_error_to_response(err: ReportError) -> axum::response::Response {
    match err {
        ReportError::UnknownKind(_) => {
            json_error(StatusCode::BAD_REQUEST, "unknown_report_kind", err.to_string())
        }
        ReportError::Pdf(_) => {
            error!(error = %err, "report rendering failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "report_error", err.to_string())
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_documented_statuses() {
        let cases = [
            (DomainError::InvalidQuantity(0), StatusCode::BAD_REQUEST),
            (DomainError::invalid_association("x"), StatusCode::BAD_REQUEST),
            (DomainError::unknown_reference("x"), StatusCode::NOT_FOUND),
            (
                DomainError::InsufficientStock {
                    requested: 5,
                    available: 1,
                },
                StatusCode::CONFLICT,
            ),
            (DomainError::in_use("x"), StatusCode::CONFLICT),
            (DomainError::quantity_overflow("x"), StatusCode::CONFLICT),
            (DomainError::relocation_incomplete("x"), StatusCode::CONFLICT),
        ];
        for (err, status) in cases {
            assert_eq!(domain_error_to_response(err).status(), status);
        }
    }

    #[test]
    fn bad_credentials_are_unauthorized() {
        let res = service_error_to_response(AuthError::InvalidCredentials.into());
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
