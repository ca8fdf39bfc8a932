//! PDF reports rendered from ledger snapshots.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::Utc;
use tracing::info;

use medstock_auth::Permission;
use medstock_ledger::StockFilter;
use medstock_report::{ReportKind, ReportTable, movement_table, render_pdf, stock_table};

use crate::app::routes::common::today;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::authorize_request;
use crate::context::OperatorContext;

pub fn router() -> Router {
    Router::new()
        .route("/stock", get(stock_report))
        .route("/movements", get(movements_report))
}

/// `?kind=medicines|inputs` (Portuguese names accepted).
pub async fn stock_report(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(operator): Extension<OperatorContext>,
    Query(query): Query<dto::StockReportQuery>,
) -> axum::response::Response {
    if let Err(e) = authorize_request(&operator, &Permission::REPORTS_READ) {
        return errors::forbidden(e);
    }
    let kind: ReportKind = match query.kind.parse() {
        Ok(k) => k,
        Err(e) => return errors::report_error_to_response(e),
    };

    let filter = StockFilter {
        item_kind: Some(kind.item_kind()),
        ..StockFilter::default()
    };
    let views = match services.ledger.query_stock(&filter, today()).await {
        Ok(v) => v,
        Err(e) => return errors::service_error_to_response(e),
    };

    pdf_response(&stock_table(kind, &views), kind_file_name(kind))
}

pub async fn movements_report(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(operator): Extension<OperatorContext>,
    Query(query): Query<dto::MovementQuery>,
) -> axum::response::Response {
    if let Err(e) = authorize_request(&operator, &Permission::REPORTS_READ) {
        return errors::forbidden(e);
    }
    let filter = match query.into_filter(Utc::now()) {
        Ok(f) => f,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let records = match services.movements.list(&filter).await {
        Ok(r) => r,
        Err(e) => return errors::service_error_to_response(e),
    };
    let names = match services.catalog.item_names().await {
        Ok(n) => n,
        Err(e) => return errors::service_error_to_response(e),
    };

    pdf_response(&movement_table(&records, &names), "movements.pdf")
}

fn kind_file_name(kind: ReportKind) -> &'static str {
    match kind {
        ReportKind::Medicines => "medicines-stock.pdf",
        ReportKind::Inputs => "inputs-stock.pdf",
    }
}

fn pdf_response(table: &ReportTable, file_name: &str) -> axum::response::Response {
    let bytes = match render_pdf(table, Utc::now()) {
        Ok(b) => b,
        Err(e) => return errors::report_error_to_response(e),
    };
    info!(rows = table.rows.len(), bytes = bytes.len(), file = file_name, "report rendered");

    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}
