//! Suppliers API endpoints.

use api_types::{
    Message,
    supplier::{SupplierNew, SupplierUpdate},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{NewSupplier, Supplier};

use crate::{ServerError, extract::JsonBody, server::ServerState};

pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<Supplier>>, ServerError> {
    let suppliers = state.engine().await?.list_suppliers().await?;
    Ok(Json(suppliers))
}

pub async fn create(
    State(state): State<ServerState>,
    JsonBody(payload): JsonBody<SupplierNew>,
) -> Result<(StatusCode, Json<Supplier>), ServerError> {
    let mut cmd = NewSupplier::new(payload.name);
    cmd.contact = payload.contact;
    cmd.phone = payload.phone;

    let supplier = state.engine().await?.create_supplier(cmd).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    JsonBody(payload): JsonBody<SupplierUpdate>,
) -> Result<Json<Supplier>, ServerError> {
    let update = engine::SupplierUpdate {
        name: payload.name,
        contact: payload.contact,
        phone: payload.phone,
    };

    let supplier = state.engine().await?.update_supplier(id, update).await?;
    Ok(Json(supplier))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<Message>, ServerError> {
    state.engine().await?.delete_supplier(id).await?;
    Ok(Json(Message::new("supplier deleted")))
}
