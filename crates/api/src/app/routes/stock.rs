use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use medstock_auth::Permission;
use medstock_ledger::{RecordEntry, RecordExit};

use crate::app::routes::common::{idempotency_key, respond, today};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::authorize_request;
use crate::context::OperatorContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(query_stock))
        .route("/summary", get(stock_summary))
        .route("/entries", post(record_entry))
        .route("/exits", post(record_exit))
}

/// Receive stock. A replayed `Idempotency-Key` returns the recorded
/// movement with `replayed: true`.
pub async fn record_entry(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(operator): Extension<OperatorContext>,
    headers: HeaderMap,
    Json(body): Json<dto::EntryRequest>,
) -> axum::response::Response {
    if let Err(e) = authorize_request(&operator, &Permission::STOCK_WRITE) {
        return errors::forbidden(e);
    }
    let key = match idempotency_key(&headers) {
        Ok(k) => k,
        Err(res) => return res,
    };

    let cmd = RecordEntry {
        idempotency_key: key,
        operator: operator.operator_id(),
        item: body.item,
        cabinet: body.cabinet,
        quantity: body.quantity,
        attrs: body.attrs,
        occurred_at: Utc::now(),
    };
    let result = services.ledger.record_entry(cmd).await;
    let status = match &result {
        Ok(receipt) if receipt.replayed => StatusCode::OK,
        _ => StatusCode::CREATED,
    };
    respond(status, result)
}

/// Dispense stock FIFO by expiry.
pub async fn record_exit(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(operator): Extension<OperatorContext>,
    headers: HeaderMap,
    Json(body): Json<dto::ExitRequest>,
) -> axum::response::Response {
    if let Err(e) = authorize_request(&operator, &Permission::STOCK_WRITE) {
        return errors::forbidden(e);
    }
    let key = match idempotency_key(&headers) {
        Ok(k) => k,
        Err(res) => return res,
    };

    let cmd = RecordExit {
        idempotency_key: key,
        operator: operator.operator_id(),
        item: body.item,
        cabinet: body.cabinet,
        quantity: body.quantity,
        casela: body.casela,
        occurred_at: Utc::now(),
    };
    let result = services.ledger.record_exit(cmd).await;
    let status = match &result {
        Ok(receipt) if receipt.replayed => StatusCode::OK,
        _ => StatusCode::CREATED,
    };
    respond(status, result)
}

pub async fn query_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(operator): Extension<OperatorContext>,
    Query(query): Query<dto::StockQuery>,
) -> axum::response::Response {
    if let Err(e) = authorize_request(&operator, &Permission::STOCK_READ) {
        return errors::forbidden(e);
    }
    let filter = match query.into_filter() {
        Ok(f) => f,
        Err(e) => return errors::domain_error_to_response(e),
    };
    respond(
        StatusCode::OK,
        services.ledger.query_stock(&filter, today()).await,
    )
}

pub async fn stock_summary(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(operator): Extension<OperatorContext>,
) -> axum::response::Response {
    if let Err(e) = authorize_request(&operator, &Permission::STOCK_READ) {
        return errors::forbidden(e);
    }
    respond(StatusCode::OK, services.ledger.summary(today()).await)
}
