use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use sea_orm::{QueryFilter, QuerySelect, TransactionTrait, prelude::*};

use crate::{
    DateRange, MoneyCents, ResultEngine, TopSeller, TopSellingQuery, TrendPoint,
    analysis::{accumulate_day, fill_trend, rank, resolve_window},
    medicines, sales,
};

use super::{Engine, reports::cost_basis, with_tx};

/// `(medicine_id, quantity, total_price_minor, sale_date)`
type SaleRow = (i64, i64, i64, DateTimeUtc);

async fn sales_in<C: ConnectionTrait>(db: &C, window: DateRange) -> ResultEngine<Vec<SaleRow>> {
    let (lower, upper) = window.bounds()?;
    let mut query = sales::Entity::find()
        .select_only()
        .column(sales::Column::MedicineId)
        .column(sales::Column::Quantity)
        .column(sales::Column::TotalPriceMinor)
        .column(sales::Column::SaleDate);
    if let Some(lower) = lower {
        query = query.filter(sales::Column::SaleDate.gte(lower));
    }
    if let Some(upper) = upper {
        query = query.filter(sales::Column::SaleDate.lt(upper));
    }
    Ok(query.into_tuple().all(db).await?)
}

impl Engine {
    /// Daily revenue, orders, units and profit over the window, one point
    /// per day (days without sales are zero). The window defaults to the 30
    /// days ending `today`.
    pub async fn sales_trend(
        &self,
        range: DateRange,
        today: NaiveDate,
    ) -> ResultEngine<Vec<TrendPoint>> {
        let window = resolve_window(range, today)?;
        let (Some(start), Some(end)) = (window.start, window.end) else {
            return Ok(Vec::new());
        };

        with_tx!(self, |db_tx| {
            let rows = sales_in(&db_tx, window).await?;
            let basis = cost_basis(&db_tx).await?;

            let mut by_day = HashMap::new();
            for (medicine_id, quantity, total, sale_date) in rows {
                accumulate_day(
                    &mut by_day,
                    sale_date.date_naive(),
                    quantity,
                    MoneyCents::new(total),
                    basis.cost_of(medicine_id, quantity),
                );
            }
            Ok(fill_trend(start, end, by_day))
        })
    }

    /// Per-medicine units, revenue and profit over the window, ranked.
    pub async fn top_selling(
        &self,
        query: TopSellingQuery,
        today: NaiveDate,
    ) -> ResultEngine<Vec<TopSeller>> {
        let window = resolve_window(query.range, today)?;

        with_tx!(self, |db_tx| {
            let rows = sales_in(&db_tx, window).await?;
            let basis = cost_basis(&db_tx).await?;

            // (units, revenue) per medicine
            let mut totals: BTreeMap<i64, (i64, MoneyCents)> = BTreeMap::new();
            for (medicine_id, quantity, total, _) in rows {
                let entry = totals.entry(medicine_id).or_default();
                entry.0 += quantity;
                entry.1 += MoneyCents::new(total);
            }

            let names: HashMap<i64, (String, String)> = medicines::Entity::find()
                .select_only()
                .column(medicines::Column::Id)
                .column(medicines::Column::Name)
                .column(medicines::Column::Code)
                .filter(medicines::Column::Id.is_in(totals.keys().copied()))
                .into_tuple::<(i64, String, String)>()
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|(id, name, code)| (id, (name, code)))
                .collect();

            let sellers = totals
                .into_iter()
                .map(|(medicine_id, (total_sold, total_revenue))| {
                    let (medicine_name, medicine_code) =
                        names.get(&medicine_id).cloned().unwrap_or_default();
                    TopSeller {
                        medicine_id,
                        medicine_name,
                        medicine_code,
                        total_sold,
                        total_revenue,
                        total_profit: total_revenue - basis.cost_of(medicine_id, total_sold),
                    }
                })
                .collect();
            Ok(rank(sellers, &query))
        })
    }
}
