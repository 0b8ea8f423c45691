//! Dashboard and report API endpoints.

use api_types::report::{DateRangeQuery, FinancialQuery};
use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;
use engine::{
    DashboardStats, FinancialPeriod, FinancialReport, InboundReport, InventoryReport, SalesReport,
};

use crate::{ServerError, server::ServerState, stock::date_range};

pub async fn dashboard(
    State(state): State<ServerState>,
) -> Result<Json<DashboardStats>, ServerError> {
    let stats = state.engine().await?.dashboard_stats(Utc::now()).await?;
    Ok(Json(stats))
}

pub async fn inbound(
    State(state): State<ServerState>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<InboundReport>, ServerError> {
    let report = state
        .engine()
        .await?
        .inbound_report(date_range(&query))
        .await?;
    Ok(Json(report))
}

pub async fn sales(
    State(state): State<ServerState>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<SalesReport>, ServerError> {
    let report = state
        .engine()
        .await?
        .sales_report(date_range(&query))
        .await?;
    Ok(Json(report))
}

pub async fn inventory(
    State(state): State<ServerState>,
) -> Result<Json<InventoryReport>, ServerError> {
    let report = state.engine().await?.inventory_report().await?;
    Ok(Json(report))
}

pub async fn financial(
    State(state): State<ServerState>,
    Query(query): Query<FinancialQuery>,
) -> Result<Json<FinancialReport>, ServerError> {
    let period = match query.kind.as_deref() {
        Some(kind) => FinancialPeriod::try_from(kind.trim())?,
        None => FinancialPeriod::default(),
    };

    let report = state
        .engine()
        .await?
        .financial_report(period, Utc::now())
        .await?;
    Ok(Json(report))
}
