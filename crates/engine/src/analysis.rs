//! Sales analysis documents: daily trend and best sellers.

use std::{cmp::Ordering, collections::HashMap};

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{DateRange, EngineError, MoneyCents, ResultEngine};

/// Days covered by the analysis when no range is given (today included).
pub(crate) const DEFAULT_WINDOW_DAYS: u64 = 30;
/// Upper bound for a trend window, so gap filling stays bounded.
pub(crate) const MAX_WINDOW_DAYS: i64 = 3_660;

pub(crate) const DEFAULT_TOP_LIMIT: u64 = 10;
pub(crate) const MAX_TOP_LIMIT: u64 = 100;

/// One calendar day of sales.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub sale_day: NaiveDate,
    #[serde(rename = "total_revenue_minor")]
    pub total_revenue: MoneyCents,
    pub order_count: u64,
    pub total_quantity: i64,
    #[serde(rename = "total_profit_minor")]
    pub total_profit: MoneyCents,
}

impl TrendPoint {
    fn empty(sale_day: NaiveDate) -> Self {
        Self {
            sale_day,
            total_revenue: MoneyCents::ZERO,
            order_count: 0,
            total_quantity: 0,
            total_profit: MoneyCents::ZERO,
        }
    }
}

/// Per-medicine totals over the analysis window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopSeller {
    pub medicine_id: i64,
    pub medicine_name: String,
    pub medicine_code: String,
    pub total_sold: i64,
    #[serde(rename = "total_revenue_minor")]
    pub total_revenue: MoneyCents,
    #[serde(rename = "total_profit_minor")]
    pub total_profit: MoneyCents,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopSellingSort {
    #[default]
    TotalSold,
    TotalRevenue,
    TotalProfit,
}

impl TryFrom<&str> for TopSellingSort {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "total_sold" => Ok(Self::TotalSold),
            "total_revenue" => Ok(Self::TotalRevenue),
            "total_profit" => Ok(Self::TotalProfit),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid sort column: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl TryFrom<&str> for SortOrder {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_ascii_uppercase().as_str() {
            "ASC" => Ok(Self::Asc),
            "DESC" => Ok(Self::Desc),
            _ => Err(EngineError::InvalidAmount(format!(
                "invalid sort order: {value}"
            ))),
        }
    }
}

/// Parameters of the best sellers ranking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TopSellingQuery {
    pub range: DateRange,
    pub sort_by: TopSellingSort,
    pub order: SortOrder,
    /// Clamped to `1..=100`.
    pub limit: u64,
}

impl Default for TopSellingQuery {
    fn default() -> Self {
        Self {
            range: DateRange::default(),
            sort_by: TopSellingSort::default(),
            order: SortOrder::default(),
            limit: DEFAULT_TOP_LIMIT,
        }
    }
}

/// Fill in missing bounds: the window ends `today` and spans
/// [`DEFAULT_WINDOW_DAYS`] days unless told otherwise.
pub(crate) fn resolve_window(range: DateRange, today: NaiveDate) -> ResultEngine<DateRange> {
    let end = range.end.unwrap_or(today);
    let start = match range.start {
        Some(start) => start,
        None => end
            .checked_sub_days(Days::new(DEFAULT_WINDOW_DAYS - 1))
            .unwrap_or(end),
    };
    if start > end {
        return Err(EngineError::InvalidAmount(format!(
            "start_date {start} is after end_date {end}"
        )));
    }
    if (end - start).num_days() >= MAX_WINDOW_DAYS {
        return Err(EngineError::InvalidAmount(format!(
            "analysis window is limited to {MAX_WINDOW_DAYS} days"
        )));
    }
    Ok(DateRange::new(Some(start), Some(end)))
}

/// One point per day in `[start, end]`, zeros where nothing was sold.
pub(crate) fn fill_trend(
    start: NaiveDate,
    end: NaiveDate,
    mut by_day: HashMap<NaiveDate, TrendPoint>,
) -> Vec<TrendPoint> {
    start
        .iter_days()
        .take_while(|day| *day <= end)
        .map(|day| by_day.remove(&day).unwrap_or_else(|| TrendPoint::empty(day)))
        .collect()
}

/// Add one sale to its day.
pub(crate) fn accumulate_day(
    by_day: &mut HashMap<NaiveDate, TrendPoint>,
    day: NaiveDate,
    quantity: i64,
    revenue: MoneyCents,
    cost: MoneyCents,
) {
    let point = by_day
        .entry(day)
        .or_insert_with(|| TrendPoint::empty(day));
    point.order_count += 1;
    point.total_quantity += quantity;
    point.total_revenue += revenue;
    point.total_profit += revenue - cost;
}

/// Sort and truncate the ranking. Ties keep the lowest medicine id first.
pub(crate) fn rank(mut sellers: Vec<TopSeller>, query: &TopSellingQuery) -> Vec<TopSeller> {
    let key = |seller: &TopSeller| match query.sort_by {
        TopSellingSort::TotalSold => seller.total_sold,
        TopSellingSort::TotalRevenue => seller.total_revenue.cents(),
        TopSellingSort::TotalProfit => seller.total_profit.cents(),
    };
    sellers.sort_by(|a, b| {
        let ordering = match query.order {
            SortOrder::Asc => key(a).cmp(&key(b)),
            SortOrder::Desc => key(b).cmp(&key(a)),
        };
        match ordering {
            Ordering::Equal => a.medicine_id.cmp(&b.medicine_id),
            other => other,
        }
    });
    let limit = query.limit.clamp(1, MAX_TOP_LIMIT);
    sellers.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
    sellers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seller(id: i64, sold: i64, revenue: i64, profit: i64) -> TopSeller {
        TopSeller {
            medicine_id: id,
            medicine_name: format!("Medicine {id}"),
            medicine_code: format!("M{id}"),
            total_sold: sold,
            total_revenue: MoneyCents::new(revenue),
            total_profit: MoneyCents::new(profit),
        }
    }

    #[test]
    fn default_window_is_thirty_days_ending_today() {
        let window = resolve_window(DateRange::default(), date(2026, 3, 30)).unwrap();
        assert_eq!(window.start, Some(date(2026, 3, 1)));
        assert_eq!(window.end, Some(date(2026, 3, 30)));
    }

    #[test]
    fn window_rejects_reversed_bounds() {
        let range = DateRange::new(Some(date(2026, 3, 5)), Some(date(2026, 3, 1)));
        assert!(resolve_window(range, date(2026, 3, 30)).is_err());
    }

    #[test]
    fn trend_fills_gaps_with_zeros() {
        let mut by_day = HashMap::new();
        accumulate_day(
            &mut by_day,
            date(2026, 3, 2),
            3,
            MoneyCents::new(300),
            MoneyCents::new(120),
        );
        let trend = fill_trend(date(2026, 3, 1), date(2026, 3, 3), by_day);
        assert_eq!(trend.len(), 3);
        assert_eq!(trend[0].order_count, 0);
        assert_eq!(trend[1].total_quantity, 3);
        assert_eq!(trend[1].total_profit, MoneyCents::new(180));
        assert_eq!(trend[2].sale_day, date(2026, 3, 3));
    }

    #[test]
    fn rank_sorts_by_requested_column() {
        let sellers = vec![seller(1, 5, 900, 100), seller(2, 9, 500, 300), seller(3, 1, 1000, 50)];

        let by_sold = rank(sellers.clone(), &TopSellingQuery::default());
        assert_eq!(
            by_sold.iter().map(|s| s.medicine_id).collect::<Vec<_>>(),
            vec![2, 1, 3]
        );

        let query = TopSellingQuery {
            sort_by: TopSellingSort::TotalRevenue,
            order: SortOrder::Asc,
            limit: 2,
            ..TopSellingQuery::default()
        };
        let by_revenue = rank(sellers, &query);
        assert_eq!(
            by_revenue.iter().map(|s| s.medicine_id).collect::<Vec<_>>(),
            vec![2, 1]
        );
    }

    #[test]
    fn sort_inputs_parse() {
        assert_eq!(SortOrder::try_from("asc").unwrap(), SortOrder::Asc);
        assert_eq!(
            TopSellingSort::try_from("total_profit").unwrap(),
            TopSellingSort::TotalProfit
        );
        assert!(TopSellingSort::try_from("name").is_err());
    }
}
