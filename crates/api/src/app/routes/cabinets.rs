//! Cabinet catalog plus the relocation flow that empties a cabinet before
//! it can be deleted.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use medstock_auth::Permission;
use medstock_catalog::CabinetDraft;
use medstock_core::CabinetId;
use medstock_ledger::{Destinations, RelocateCabinet};

use crate::app::routes::common::{idempotency_key, no_content, parse_id, respond};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::authorize_request;
use crate::context::OperatorContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_cabinets).post(create_cabinet))
        .route(
            "/:id",
            get(get_cabinet).put(update_cabinet).delete(delete_cabinet),
        )
        .route("/:id/stock-info", get(inspect_cabinet))
        .route("/:id/relocate", post(relocate_cabinet))
}

pub async fn list_cabinets(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(operator): Extension<OperatorContext>,
) -> axum::response::Response {
    if let Err(e) = authorize_request(&operator, &Permission::CATALOG_READ) {
        return errors::forbidden(e);
    }
    respond(StatusCode::OK, services.catalog.list_cabinets().await)
}

pub async fn create_cabinet(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(operator): Extension<OperatorContext>,
    Json(body): Json<CabinetDraft>,
) -> axum::response::Response {
    if let Err(e) = authorize_request(&operator, &Permission::CATALOG_WRITE) {
        return errors::forbidden(e);
    }
    respond(StatusCode::CREATED, services.catalog.create_cabinet(body).await)
}

pub async fn get_cabinet(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(operator): Extension<OperatorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = authorize_request(&operator, &Permission::CATALOG_READ) {
        return errors::forbidden(e);
    }
    let id: CabinetId = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    respond(StatusCode::OK, services.catalog.get_cabinet(id).await)
}

pub async fn update_cabinet(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(operator): Extension<OperatorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateCabinetRequest>,
) -> axum::response::Response {
    if let Err(e) = authorize_request(&operator, &Permission::CATALOG_WRITE) {
        return errors::forbidden(e);
    }
    let id: CabinetId = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    respond(
        StatusCode::OK,
        services.catalog.update_cabinet(id, &body.category).await,
    )
}

pub async fn delete_cabinet(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(operator): Extension<OperatorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = authorize_request(&operator, &Permission::CATALOG_WRITE) {
        return errors::forbidden(e);
    }
    let id: CabinetId = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    no_content(services.catalog.delete_cabinet(id).await)
}

/// What the cabinet holds and which destinations a relocation will need.
pub async fn inspect_cabinet(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(operator): Extension<OperatorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = authorize_request(&operator, &Permission::STOCK_READ) {
        return errors::forbidden(e);
    }
    let id: CabinetId = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    respond(StatusCode::OK, services.relocation.inspect(id).await)
}

pub async fn relocate_cabinet(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(operator): Extension<OperatorContext>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Destinations>,
) -> axum::response::Response {
    if let Err(e) = authorize_request(&operator, &Permission::STOCK_WRITE) {
        return errors::forbidden(e);
    }
    let origin: CabinetId = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let key = match idempotency_key(&headers) {
        Ok(k) => k,
        Err(res) => return res,
    };

    let cmd = RelocateCabinet {
        idempotency_key: key,
        operator: operator.operator_id(),
        origin,
        destinations: body,
        occurred_at: Utc::now(),
    };
    respond(StatusCode::OK, services.relocation.relocate(cmd).await)
}
