//! Customers API endpoints.

use api_types::{
    Message,
    customer::{CustomerNew, CustomerUpdate},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{Customer, NewCustomer};

use crate::{ServerError, extract::JsonBody, server::ServerState};

pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<Customer>>, ServerError> {
    let customers = state.engine().await?.list_customers().await?;
    Ok(Json(customers))
}

pub async fn create(
    State(state): State<ServerState>,
    JsonBody(payload): JsonBody<CustomerNew>,
) -> Result<(StatusCode, Json<Customer>), ServerError> {
    let mut cmd = NewCustomer::new(payload.name);
    cmd.phone = payload.phone;

    let customer = state.engine().await?.create_customer(cmd).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    JsonBody(payload): JsonBody<CustomerUpdate>,
) -> Result<Json<Customer>, ServerError> {
    let update = engine::CustomerUpdate {
        name: payload.name,
        phone: payload.phone,
    };

    let customer = state.engine().await?.update_customer(id, update).await?;
    Ok(Json(customer))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<Message>, ServerError> {
    state.engine().await?.delete_customer(id).await?;
    Ok(Json(Message::new("customer deleted")))
}
