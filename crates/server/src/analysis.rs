//! Sales analysis API endpoints.

use api_types::{analysis::TopSellingParams, report::DateRangeQuery};
use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;
use engine::{DateRange, SortOrder, TopSeller, TopSellingQuery, TopSellingSort, TrendPoint};

use crate::{ServerError, server::ServerState, stock::date_range};

pub async fn trend(
    State(state): State<ServerState>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<Vec<TrendPoint>>, ServerError> {
    let trend = state
        .engine()
        .await?
        .sales_trend(date_range(&query), Utc::now().date_naive())
        .await?;
    Ok(Json(trend))
}

fn top_selling_query(params: TopSellingParams) -> Result<TopSellingQuery, ServerError> {
    let mut query = TopSellingQuery {
        range: DateRange::new(params.start_date, params.end_date),
        ..TopSellingQuery::default()
    };
    if let Some(sort_by) = params.sort_by.as_deref() {
        query.sort_by = TopSellingSort::try_from(sort_by.trim())?;
    }
    if let Some(order) = params.order.as_deref() {
        query.order = SortOrder::try_from(order.trim())?;
    }
    if let Some(limit) = params.limit {
        query.limit = limit;
    }
    Ok(query)
}

pub async fn top_selling(
    State(state): State<ServerState>,
    Query(params): Query<TopSellingParams>,
) -> Result<Json<Vec<TopSeller>>, ServerError> {
    let query = top_selling_query(params)?;
    let sellers = state
        .engine()
        .await?
        .top_selling(query, Utc::now().date_naive())
        .await?;
    Ok(Json(sellers))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_params_are_missing() {
        let query = top_selling_query(TopSellingParams::default()).unwrap();
        assert_eq!(query, TopSellingQuery::default());
    }

    #[test]
    fn parses_sort_and_order() {
        let query = top_selling_query(TopSellingParams {
            sort_by: Some("total_profit".to_string()),
            order: Some("asc".to_string()),
            limit: Some(3),
            ..TopSellingParams::default()
        })
        .unwrap();
        assert_eq!(query.sort_by, TopSellingSort::TotalProfit);
        assert_eq!(query.order, SortOrder::Asc);
        assert_eq!(query.limit, 3);
    }

    #[test]
    fn rejects_unknown_sort_column() {
        let params = TopSellingParams {
            sort_by: Some("price".to_string()),
            ..TopSellingParams::default()
        };
        assert!(top_selling_query(params).is_err());
    }
}
