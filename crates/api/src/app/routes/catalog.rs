//! Medicine, input and resident catalog endpoints.
//!
//! Reads need `catalog.read`, writes `catalog.write`. Deletes are refused
//! with 409 while stock rows still reference the entity.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use medstock_auth::Permission;
use medstock_catalog::{InputDraft, MedicineDraft, ResidentDraft};
use medstock_core::{Casela, InputId, MedicineId};

use crate::app::routes::common::{no_content, parse_id, respond};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::authorize_request;
use crate::context::OperatorContext;

pub fn medicines_router() -> Router {
    Router::new()
        .route("/", get(list_medicines).post(create_medicine))
        .route(
            "/:id",
            get(get_medicine).put(update_medicine).delete(delete_medicine),
        )
}

pub fn inputs_router() -> Router {
    Router::new()
        .route("/", get(list_inputs).post(create_input))
        .route("/:id", get(get_input).put(update_input).delete(delete_input))
}

pub fn residents_router() -> Router {
    Router::new()
        .route("/", get(list_residents).post(create_resident))
        .route(
            "/:id",
            get(get_resident).put(update_resident).delete(delete_resident),
        )
}

// -------------------------
// Medicines
// -------------------------

pub async fn list_medicines(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(operator): Extension<OperatorContext>,
) -> axum::response::Response {
    if let Err(e) = authorize_request(&operator, &Permission::CATALOG_READ) {
        return errors::forbidden(e);
    }
    respond(StatusCode::OK, services.catalog.list_medicines().await)
}

pub async fn create_medicine(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(operator): Extension<OperatorContext>,
    Json(body): Json<MedicineDraft>,
) -> axum::response::Response {
    if let Err(e) = authorize_request(&operator, &Permission::CATALOG_WRITE) {
        return errors::forbidden(e);
    }
    respond(StatusCode::CREATED, services.catalog.create_medicine(body).await)
}

pub async fn get_medicine(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(operator): Extension<OperatorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = authorize_request(&operator, &Permission::CATALOG_READ) {
        return errors::forbidden(e);
    }
    let id: MedicineId = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    respond(StatusCode::OK, services.catalog.get_medicine(id).await)
}

pub async fn update_medicine(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(operator): Extension<OperatorContext>,
    Path(id): Path<String>,
    Json(body): Json<MedicineDraft>,
) -> axum::response::Response {
    if let Err(e) = authorize_request(&operator, &Permission::CATALOG_WRITE) {
        return errors::forbidden(e);
    }
    let id: MedicineId = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    respond(StatusCode::OK, services.catalog.update_medicine(id, body).await)
}

pub async fn delete_medicine(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(operator): Extension<OperatorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = authorize_request(&operator, &Permission::CATALOG_WRITE) {
        return errors::forbidden(e);
    }
    let id: MedicineId = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    no_content(services.catalog.delete_medicine(id).await)
}

// -------------------------
// Inputs
// -------------------------

pub async fn list_inputs(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(operator): Extension<OperatorContext>,
) -> axum::response::Response {
    if let Err(e) = authorize_request(&operator, &Permission::CATALOG_READ) {
        return errors::forbidden(e);
    }
    respond(StatusCode::OK, services.catalog.list_inputs().await)
}

pub async fn create_input(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(operator): Extension<OperatorContext>,
    Json(body): Json<InputDraft>,
) -> axum::response::Response {
    if let Err(e) = authorize_request(&operator, &Permission::CATALOG_WRITE) {
        return errors::forbidden(e);
    }
    respond(StatusCode::CREATED, services.catalog.create_input(body).await)
}

pub async fn get_input(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(operator): Extension<OperatorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = authorize_request(&operator, &Permission::CATALOG_READ) {
        return errors::forbidden(e);
    }
    let id: InputId = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    respond(StatusCode::OK, services.catalog.get_input(id).await)
}

pub async fn update_input(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(operator): Extension<OperatorContext>,
    Path(id): Path<String>,
    Json(body): Json<InputDraft>,
) -> axum::response::Response {
    if let Err(e) = authorize_request(&operator, &Permission::CATALOG_WRITE) {
        return errors::forbidden(e);
    }
    let id: InputId = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    respond(StatusCode::OK, services.catalog.update_input(id, body).await)
}

pub async fn delete_input(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(operator): Extension<OperatorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = authorize_request(&operator, &Permission::CATALOG_WRITE) {
        return errors::forbidden(e);
    }
    let id: InputId = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    no_content(services.catalog.delete_input(id).await)
}

// -------------------------
// Residents (keyed by casela)
// -------------------------

pub async fn list_residents(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(operator): Extension<OperatorContext>,
) -> axum::response::Response {
    if let Err(e) = authorize_request(&operator, &Permission::CATALOG_READ) {
        return errors::forbidden(e);
    }
    respond(StatusCode::OK, services.catalog.list_residents().await)
}

pub async fn create_resident(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(operator): Extension<OperatorContext>,
    Json(body): Json<ResidentDraft>,
) -> axum::response::Response {
    if let Err(e) = authorize_request(&operator, &Permission::CATALOG_WRITE) {
        return errors::forbidden(e);
    }
    respond(StatusCode::CREATED, services.catalog.create_resident(body).await)
}

pub async fn get_resident(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(operator): Extension<OperatorContext>,
    Path(casela): Path<String>,
) -> axum::response::Response {
    if let Err(e) = authorize_request(&operator, &Permission::CATALOG_READ) {
        return errors::forbidden(e);
    }
    let casela: Casela = match parse_id(&casela) {
        Ok(v) => v,
        Err(res) => return res,
    };
    respond(StatusCode::OK, services.catalog.get_resident(casela).await)
}

pub async fn update_resident(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(operator): Extension<OperatorContext>,
    Path(casela): Path<String>,
    Json(body): Json<dto::UpdateResidentRequest>,
) -> axum::response::Response {
    if let Err(e) = authorize_request(&operator, &Permission::CATALOG_WRITE) {
        return errors::forbidden(e);
    }
    let casela: Casela = match parse_id(&casela) {
        Ok(v) => v,
        Err(res) => return res,
    };
    respond(
        StatusCode::OK,
        services.catalog.update_resident(casela, &body.name).await,
    )
}

pub async fn delete_resident(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(operator): Extension<OperatorContext>,
    Path(casela): Path<String>,
) -> axum::response::Response {
    if let Err(e) = authorize_request(&operator, &Permission::CATALOG_WRITE) {
        return errors::forbidden(e);
    }
    let casela: Casela = match parse_id(&casela) {
        Ok(v) => v,
        Err(res) => return res,
    };
    no_content(services.catalog.delete_resident(casela).await)
}
