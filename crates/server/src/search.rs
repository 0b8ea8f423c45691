//! Keyword search API endpoints.

use api_types::search::SearchQuery;
use axum::{
    Json,
    extract::{Query, State},
};
use engine::{Customer, Supplier, User};

use crate::{ServerError, server::ServerState};

fn keyword(query: &SearchQuery) -> &str {
    query.keyword.as_deref().unwrap_or_default().trim()
}

pub async fn users(
    State(state): State<ServerState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<User>>, ServerError> {
    let users = state.engine().await?.search_users(keyword(&query)).await?;
    Ok(Json(users))
}

pub async fn customers(
    State(state): State<ServerState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Customer>>, ServerError> {
    let customers = state
        .engine()
        .await?
        .search_customers(keyword(&query))
        .await?;
    Ok(Json(customers))
}

pub async fn suppliers(
    State(state): State<ServerState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Supplier>>, ServerError> {
    let suppliers = state
        .engine()
        .await?
        .search_suppliers(keyword(&query))
        .await?;
    Ok(Json(suppliers))
}
