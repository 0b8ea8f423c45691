//! Medicine catalog API endpoints.

use api_types::{
    Message,
    medicine::{MedicineList, MedicineNew, MedicineUpdate},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{Medicine, MedicineStatus, MoneyCents, NewMedicine};

use crate::{ServerError, extract::JsonBody, server::ServerState};

fn parse_status(raw: Option<&str>) -> Result<Option<MedicineStatus>, ServerError> {
    raw.map(|status| MedicineStatus::try_from(status.trim()).map_err(ServerError::from))
        .transpose()
}

pub async fn list(
    State(state): State<ServerState>,
    Query(params): Query<MedicineList>,
) -> Result<Json<Vec<Medicine>>, ServerError> {
    let medicines = state
        .engine()
        .await?
        .list_medicines(params.search.as_deref())
        .await?;
    Ok(Json(medicines))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<Medicine>, ServerError> {
    let medicine = state.engine().await?.medicine(id).await?;
    Ok(Json(medicine))
}

pub async fn create(
    State(state): State<ServerState>,
    JsonBody(payload): JsonBody<MedicineNew>,
) -> Result<(StatusCode, Json<Medicine>), ServerError> {
    let mut cmd = NewMedicine::new(
        payload.code,
        payload.name,
        payload.kind,
        MoneyCents::new(payload.price_minor),
    );
    cmd.spec = payload.spec;
    cmd.manufacturer = payload.manufacturer;
    if let Some(stock) = payload.stock {
        cmd = cmd.stock(stock);
    }
    if let Some(status) = parse_status(payload.status.as_deref())? {
        cmd = cmd.status(status);
    }

    let medicine = state.engine().await?.create_medicine(cmd).await?;
    Ok((StatusCode::CREATED, Json(medicine)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    JsonBody(payload): JsonBody<MedicineUpdate>,
) -> Result<Json<Medicine>, ServerError> {
    let update = engine::MedicineUpdate {
        status: parse_status(payload.status.as_deref())?,
        code: payload.code,
        name: payload.name,
        kind: payload.kind,
        spec: payload.spec,
        price: payload.price_minor.map(MoneyCents::new),
        manufacturer: payload.manufacturer,
    };

    let medicine = state.engine().await?.update_medicine(id, update).await?;
    Ok(Json(medicine))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<Message>, ServerError> {
    state.engine().await?.delete_medicine(id).await?;
    Ok(Json(Message::new("medicine deleted")))
}
