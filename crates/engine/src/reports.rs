//! Report documents and the cost model shared by reports and analysis.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{EngineError, InboundDetail, Medicine, MoneyCents, SaleDetail, util::day_start};

/// Medicines with less stock than this count as low on stock.
pub const LOW_STOCK_THRESHOLD: i64 = 50;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    /// Units on hand across the whole catalog.
    pub total_stock: i64,
    /// Sale totals of the last month.
    #[serde(rename = "month_sales_minor")]
    pub month_sales: MoneyCents,
    /// Number of medicines below [`LOW_STOCK_THRESHOLD`].
    pub low_stock: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundReport {
    pub records: Vec<InboundDetail>,
    pub total_quantity: i64,
    #[serde(rename = "total_amount_minor")]
    pub total_amount: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesReport {
    pub records: Vec<SaleDetail>,
    pub total_quantity: i64,
    #[serde(rename = "total_amount_minor")]
    pub total_amount: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryReport {
    /// Whole catalog, lowest stock first.
    pub medicines: Vec<Medicine>,
    pub total_stock: i64,
    #[serde(rename = "total_value_minor")]
    pub total_value: MoneyCents,
    /// In stock but below [`LOW_STOCK_THRESHOLD`].
    pub low_stock_items: Vec<Medicine>,
    pub out_of_stock_items: Vec<Medicine>,
}

impl InventoryReport {
    pub(crate) fn from_medicines(medicines: Vec<Medicine>) -> Self {
        let mut total_stock = 0;
        let mut total_value = MoneyCents::ZERO;
        let mut low_stock_items = Vec::new();
        let mut out_of_stock_items = Vec::new();

        for medicine in &medicines {
            total_stock += medicine.stock;
            total_value += medicine
                .price
                .checked_mul(medicine.stock)
                .unwrap_or(MoneyCents::new(i64::MAX));
            if medicine.stock == 0 {
                out_of_stock_items.push(medicine.clone());
            } else if medicine.stock < LOW_STOCK_THRESHOLD {
                low_stock_items.push(medicine.clone());
            }
        }

        Self {
            medicines,
            total_stock,
            total_value,
            low_stock_items,
            out_of_stock_items,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinancialPeriod {
    /// Since midnight today.
    Daily,
    /// Since the first day of the current month.
    #[default]
    Monthly,
}

impl FinancialPeriod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Monthly => "monthly",
        }
    }

    /// First instant of the period containing `now`.
    pub(crate) fn start(self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.date_naive();
        let first = match self {
            Self::Daily => today,
            Self::Monthly => {
                NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today)
            }
        };
        day_start(first)
    }
}

impl TryFrom<&str> for FinancialPeriod {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "daily" => Ok(Self::Daily),
            "monthly" => Ok(Self::Monthly),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid report type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialReport {
    pub report_type: FinancialPeriod,
    pub start_date: DateTime<Utc>,
    #[serde(rename = "sales_income_minor")]
    pub sales_income: MoneyCents,
    /// What was spent on inbound shipments in the period.
    #[serde(rename = "purchase_cost_minor")]
    pub purchase_cost: MoneyCents,
    /// Income minus the cost of the goods sold.
    #[serde(rename = "gross_profit_minor")]
    pub gross_profit: MoneyCents,
    pub sales_count: u64,
    pub purchase_count: u64,
}

/// Cost of goods sold, estimated with the average inbound unit price of
/// each medicine over its whole history (plain mean of the unit prices).
#[derive(Debug, Default)]
pub(crate) struct CostBasis {
    prices: HashMap<i64, (i128, i128)>,
}

impl CostBasis {
    pub(crate) fn from_inbounds(rows: impl IntoIterator<Item = (i64, MoneyCents)>) -> Self {
        let mut prices: HashMap<i64, (i128, i128)> = HashMap::new();
        for (medicine_id, unit_price) in rows {
            let entry = prices.entry(medicine_id).or_default();
            entry.0 += i128::from(unit_price.cents());
            entry.1 += 1;
        }
        Self { prices }
    }

    /// Cost of `quantity` units, rounded to the nearest cent. Medicines that
    /// were never received cost nothing.
    pub(crate) fn cost_of(&self, medicine_id: i64, quantity: i64) -> MoneyCents {
        let Some(&(sum, count)) = self.prices.get(&medicine_id) else {
            return MoneyCents::ZERO;
        };
        let numerator = i128::from(quantity) * sum;
        let rounded = (2 * numerator + count) / (2 * count);
        MoneyCents::new(i64::try_from(rounded).unwrap_or(i64::MAX))
    }
}
