use chrono::{DateTime, Months, Utc};
use sea_orm::{PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};

use crate::{
    DashboardStats, DateRange, FinancialPeriod, FinancialReport, InboundReport, InventoryReport,
    LOW_STOCK_THRESHOLD, Medicine, MoneyCents, ResultEngine, SalesReport, inbounds, medicines,
    reports::CostBasis, sales,
};

use super::{
    Engine,
    ledger::{inbound_details, sale_details},
    with_tx,
};

/// `(medicine_id, unit_price)` of every inbound row ever received.
pub(super) async fn cost_basis<C: ConnectionTrait>(db: &C) -> ResultEngine<CostBasis> {
    let rows: Vec<(i64, i64)> = inbounds::Entity::find()
        .select_only()
        .column(inbounds::Column::MedicineId)
        .column(inbounds::Column::UnitPriceMinor)
        .into_tuple()
        .all(db)
        .await?;
    Ok(CostBasis::from_inbounds(
        rows.into_iter()
            .map(|(medicine_id, price)| (medicine_id, MoneyCents::new(price))),
    ))
}

impl Engine {
    /// Headline numbers: stock on hand, sales of the last month and how many
    /// medicines run low.
    pub async fn dashboard_stats(&self, now: DateTime<Utc>) -> ResultEngine<DashboardStats> {
        let since = now.checked_sub_months(Months::new(1)).unwrap_or(now);
        with_tx!(self, |db_tx| {
            let stocks: Vec<i64> = medicines::Entity::find()
                .select_only()
                .column(medicines::Column::Stock)
                .into_tuple()
                .all(&db_tx)
                .await?;
            let totals: Vec<i64> = sales::Entity::find()
                .select_only()
                .column(sales::Column::TotalPriceMinor)
                .filter(sales::Column::SaleDate.gt(since))
                .into_tuple()
                .all(&db_tx)
                .await?;
            let low_stock = medicines::Entity::find()
                .filter(medicines::Column::Stock.lt(LOW_STOCK_THRESHOLD))
                .count(&db_tx)
                .await?;

            Ok(DashboardStats {
                total_stock: stocks.into_iter().sum(),
                month_sales: totals.into_iter().map(MoneyCents::new).sum(),
                low_stock,
            })
        })
    }

    pub async fn inbound_report(&self, range: DateRange) -> ResultEngine<InboundReport> {
        let records = inbound_details(&self.database, range).await?;
        let total_quantity = records.iter().map(|r| r.record.quantity).sum();
        let total_amount = records.iter().map(|r| r.record.amount()).sum();
        Ok(InboundReport {
            records,
            total_quantity,
            total_amount,
        })
    }

    pub async fn sales_report(&self, range: DateRange) -> ResultEngine<SalesReport> {
        let records = sale_details(&self.database, range).await?;
        let total_quantity = records.iter().map(|r| r.record.quantity).sum();
        let total_amount = records.iter().map(|r| r.record.total_price).sum();
        Ok(SalesReport {
            records,
            total_quantity,
            total_amount,
        })
    }

    pub async fn inventory_report(&self) -> ResultEngine<InventoryReport> {
        let medicines = medicines::Entity::find()
            .order_by_asc(medicines::Column::Stock)
            .order_by_asc(medicines::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Medicine::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        Ok(InventoryReport::from_medicines(medicines))
    }

    /// Income, purchase spending and gross profit since the start of the
    /// current day or month.
    pub async fn financial_report(
        &self,
        period: FinancialPeriod,
        now: DateTime<Utc>,
    ) -> ResultEngine<FinancialReport> {
        let start = period.start(now);
        with_tx!(self, |db_tx| {
            let sold: Vec<(i64, i64, i64)> = sales::Entity::find()
                .select_only()
                .column(sales::Column::MedicineId)
                .column(sales::Column::Quantity)
                .column(sales::Column::TotalPriceMinor)
                .filter(sales::Column::SaleDate.gte(start))
                .into_tuple()
                .all(&db_tx)
                .await?;
            let bought: Vec<(i64, i64)> = inbounds::Entity::find()
                .select_only()
                .column(inbounds::Column::Quantity)
                .column(inbounds::Column::UnitPriceMinor)
                .filter(inbounds::Column::InboundDate.gte(start))
                .into_tuple()
                .all(&db_tx)
                .await?;
            let basis = cost_basis(&db_tx).await?;

            let sales_income: MoneyCents = sold
                .iter()
                .map(|&(_, _, total)| MoneyCents::new(total))
                .sum();
            let cost_of_goods: MoneyCents = sold
                .iter()
                .map(|&(medicine_id, quantity, _)| basis.cost_of(medicine_id, quantity))
                .sum();
            let purchase_cost: MoneyCents = bought
                .iter()
                .map(|&(quantity, price)| MoneyCents::new(price.saturating_mul(quantity)))
                .sum();

            Ok(FinancialReport {
                report_type: period,
                start_date: start,
                sales_income,
                purchase_cost,
                gross_profit: sales_income - cost_of_goods,
                sales_count: sold.len() as u64,
                purchase_count: bought.len() as u64,
            })
        })
    }
}
