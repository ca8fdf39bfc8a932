use core::str::FromStr;

use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use medstock_core::{DomainError, IdempotencyKey};
use medstock_infra::ServiceError;

use crate::app::errors;

pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Read the client-supplied `Idempotency-Key` header (a UUID).
pub fn idempotency_key(headers: &HeaderMap) -> Result<IdempotencyKey, axum::response::Response> {
    let raw = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            errors::json_error(
                StatusCode::BAD_REQUEST,
                "missing_idempotency_key",
                "mutating stock calls require an Idempotency-Key header",
            )
        })?;

    Uuid::parse_str(raw.trim())
        .map(IdempotencyKey::from_uuid)
        .map_err(|_| {
            errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_idempotency_key",
                "Idempotency-Key must be a UUID",
            )
        })
}

/// Parse a path segment into a typed id.
pub fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse().map_err(errors::domain_error_to_response)
}

/// Serialize a service result with `status`, or map its error.
pub fn respond<T: Serialize>(
    status: StatusCode,
    result: Result<T, ServiceError>,
) -> axum::response::Response {
    match result {
        Ok(value) => (status, Json(value)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub fn no_content(result: Result<(), ServiceError>) -> axum::response::Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Calendar date the relative stock predicates are evaluated against.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn idempotency_key_must_be_a_uuid() {
        let mut headers = HeaderMap::new();
        assert!(idempotency_key(&headers).is_err());

        headers.insert(IDEMPOTENCY_KEY_HEADER, HeaderValue::from_static("abc"));
        assert_eq!(
            idempotency_key(&headers).map_err(|r| r.status()).err(),
            Some(StatusCode::BAD_REQUEST)
        );

        let key = Uuid::now_v7();
        headers.insert(
            IDEMPOTENCY_KEY_HEADER,
            HeaderValue::from_str(&key.to_string()).unwrap(),
        );
        let parsed = idempotency_key(&headers).map_err(|r| r.status()).unwrap();
        assert_eq!(*parsed.as_uuid(), key);
    }

    #[test]
    fn malformed_path_id_is_bad_request() {
        let res = parse_id::<medstock_core::MedicineId>("abc").map_err(|r| r.status());
        assert_eq!(res, Err(StatusCode::BAD_REQUEST));
        let res = parse_id::<medstock_core::CabinetId>("7").map_err(|r| r.status());
        assert_eq!(res, Ok(medstock_core::CabinetId::new(7)));
    }
}
