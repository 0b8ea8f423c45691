//! Stock ledger API endpoints: inbounds, sales, returns and adjustments.

use api_types::{
    report::DateRangeQuery,
    stock::{InboundNew, PurchaseReturn, SaleNew, SaleReturn, StockAdjust},
};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use engine::{
    DateRange, InboundDetail, InboundRecord, MoneyCents, PurchaseReversal, ReceiveStockCmd,
    SaleDetail, SaleRecord, SaleReversal, SellStockCmd, StockAdjustment,
};

use crate::{ServerError, extract::JsonBody, server::ServerState};

pub(crate) fn date_range(query: &DateRangeQuery) -> DateRange {
    DateRange::new(query.start_date, query.end_date)
}

pub async fn list_inbounds(
    State(state): State<ServerState>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<Vec<InboundDetail>>, ServerError> {
    let inbounds = state
        .engine()
        .await?
        .list_inbounds(date_range(&query))
        .await?;
    Ok(Json(inbounds))
}

pub async fn receive(
    State(state): State<ServerState>,
    JsonBody(payload): JsonBody<InboundNew>,
) -> Result<(StatusCode, Json<InboundRecord>), ServerError> {
    let mut cmd = ReceiveStockCmd::new(
        payload.medicine_id,
        payload.quantity,
        MoneyCents::new(payload.unit_price_minor),
    );
    cmd.supplier_id = payload.supplier_id;

    let record = state.engine().await?.receive_stock(cmd).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_sales(
    State(state): State<ServerState>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<Vec<SaleDetail>>, ServerError> {
    let sales = state
        .engine()
        .await?
        .list_sales(date_range(&query))
        .await?;
    Ok(Json(sales))
}

pub async fn sell(
    State(state): State<ServerState>,
    JsonBody(payload): JsonBody<SaleNew>,
) -> Result<(StatusCode, Json<SaleRecord>), ServerError> {
    let mut cmd = SellStockCmd::new(payload.medicine_id, payload.quantity);
    cmd.customer_id = payload.customer_id;

    let record = state.engine().await?.sell_stock(cmd).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn return_sale(
    State(state): State<ServerState>,
    JsonBody(payload): JsonBody<SaleReturn>,
) -> Result<Json<SaleReversal>, ServerError> {
    let reversal = state.engine().await?.reverse_sale(payload.sale_id).await?;
    Ok(Json(reversal))
}

pub async fn return_purchase(
    State(state): State<ServerState>,
    JsonBody(payload): JsonBody<PurchaseReturn>,
) -> Result<Json<PurchaseReversal>, ServerError> {
    let reversal = state
        .engine()
        .await?
        .reverse_purchase(payload.inbound_id)
        .await?;
    Ok(Json(reversal))
}

pub async fn adjust(
    State(state): State<ServerState>,
    JsonBody(payload): JsonBody<StockAdjust>,
) -> Result<Json<StockAdjustment>, ServerError> {
    let adjustment = state
        .engine()
        .await?
        .adjust_stock(payload.medicine_id, payload.new_stock)
        .await?;
    Ok(Json(adjustment))
}
