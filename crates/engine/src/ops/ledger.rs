//! Stock ledger: the only code that moves `medicines.stock`.
//!
//! Every operation touches one medicine and runs as one transaction.
//! Decrements are a single conditional `UPDATE ... WHERE stock >= q`, so the
//! check and the write cannot be split by a concurrent seller: whoever comes
//! second sees the already decremented value and fails cleanly.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*, sea_query::Expr,
};
use tracing::{debug, warn};

use crate::{
    DateRange, EngineError, InboundDetail, InboundRecord, PurchaseReversal, ReceiveStockCmd,
    ResultEngine, SaleDetail, SaleRecord, SaleReversal, SellStockCmd, StockAdjustment, customers,
    inbounds, medicines, sales, suppliers,
    util::ensure_positive_quantity,
};

use super::{Engine, with_tx};

/// `stock = stock + delta` on one medicine. Returns the affected row count.
async fn add_stock<C: ConnectionTrait>(db: &C, medicine_id: i64, delta: i64) -> ResultEngine<u64> {
    let result = medicines::Entity::update_many()
        .col_expr(
            medicines::Column::Stock,
            Expr::col(medicines::Column::Stock).add(delta),
        )
        .filter(medicines::Column::Id.eq(medicine_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// `stock = stock - quantity` only when enough stock is on hand.
///
/// Zero affected rows means the medicine is missing or short; the caller
/// tells the two apart.
async fn take_stock<C: ConnectionTrait>(db: &C, medicine_id: i64, quantity: i64) -> ResultEngine<u64> {
    let result = medicines::Entity::update_many()
        .col_expr(
            medicines::Column::Stock,
            Expr::col(medicines::Column::Stock).sub(quantity),
        )
        .filter(medicines::Column::Id.eq(medicine_id))
        .filter(medicines::Column::Stock.gte(quantity))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Build the error for a failed conditional decrement.
async fn shortage_error<C: ConnectionTrait>(
    db: &C,
    medicine_id: i64,
    requested: i64,
) -> ResultEngine<EngineError> {
    let medicine = medicines::Entity::find_by_id(medicine_id).one(db).await?;
    Ok(match medicine {
        None => EngineError::KeyNotFound("medicine not exists".to_string()),
        Some(model) => EngineError::InsufficientStock(format!(
            "{} has {} in stock, {requested} requested",
            model.name, model.stock
        )),
    })
}

async fn require_medicine<C: ConnectionTrait>(db: &C, medicine_id: i64) -> ResultEngine<medicines::Model> {
    medicines::Entity::find_by_id(medicine_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("medicine not exists".to_string()))
}

/// Names of the medicines with the given ids.
pub(super) async fn medicine_names<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = i64>,
) -> ResultEngine<HashMap<i64, String>> {
    let ids: BTreeSet<i64> = ids.into_iter().collect();
    let rows: Vec<(i64, String)> = medicines::Entity::find()
        .select_only()
        .column(medicines::Column::Id)
        .column(medicines::Column::Name)
        .filter(medicines::Column::Id.is_in(ids))
        .into_tuple()
        .all(db)
        .await?;
    Ok(rows.into_iter().collect())
}

/// Inbound rows in `range`, newest first, with medicine and supplier names.
pub(super) async fn inbound_details<C: ConnectionTrait>(
    db: &C,
    range: DateRange,
) -> ResultEngine<Vec<InboundDetail>> {
    let (lower, upper) = range.bounds()?;
    let mut query = inbounds::Entity::find()
        .order_by_desc(inbounds::Column::InboundDate)
        .order_by_desc(inbounds::Column::Id);
    if let Some(lower) = lower {
        query = query.filter(inbounds::Column::InboundDate.gte(lower));
    }
    if let Some(upper) = upper {
        query = query.filter(inbounds::Column::InboundDate.lt(upper));
    }
    let rows = query.all(db).await?;

    let medicine_names = medicine_names(db, rows.iter().map(|r| r.medicine_id)).await?;
    let supplier_ids: BTreeSet<i64> = rows.iter().filter_map(|r| r.supplier_id).collect();
    let supplier_names: HashMap<i64, String> = suppliers::Entity::find()
        .select_only()
        .column(suppliers::Column::Id)
        .column(suppliers::Column::Name)
        .filter(suppliers::Column::Id.is_in(supplier_ids))
        .into_tuple::<(i64, String)>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    Ok(rows
        .into_iter()
        .map(|model| {
            let medicine_name = medicine_names.get(&model.medicine_id).cloned();
            let supplier_name = model
                .supplier_id
                .and_then(|id| supplier_names.get(&id).cloned());
            InboundDetail {
                record: model.into(),
                medicine_name,
                supplier_name,
            }
        })
        .collect())
}

/// Sale rows in `range`, newest first, with medicine and customer names.
pub(super) async fn sale_details<C: ConnectionTrait>(
    db: &C,
    range: DateRange,
) -> ResultEngine<Vec<SaleDetail>> {
    let (lower, upper) = range.bounds()?;
    let mut query = sales::Entity::find()
        .order_by_desc(sales::Column::SaleDate)
        .order_by_desc(sales::Column::Id);
    if let Some(lower) = lower {
        query = query.filter(sales::Column::SaleDate.gte(lower));
    }
    if let Some(upper) = upper {
        query = query.filter(sales::Column::SaleDate.lt(upper));
    }
    let rows = query.all(db).await?;

    let medicine_names = medicine_names(db, rows.iter().map(|r| r.medicine_id)).await?;
    let customer_ids: BTreeSet<i64> = rows.iter().filter_map(|r| r.customer_id).collect();
    let customer_names: HashMap<i64, String> = customers::Entity::find()
        .select_only()
        .column(customers::Column::Id)
        .column(customers::Column::Name)
        .filter(customers::Column::Id.is_in(customer_ids))
        .into_tuple::<(i64, String)>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    Ok(rows
        .into_iter()
        .map(|model| {
            let medicine_name = medicine_names.get(&model.medicine_id).cloned();
            let customer_name = model
                .customer_id
                .and_then(|id| customer_names.get(&id).cloned());
            SaleDetail {
                record: model.into(),
                medicine_name,
                customer_name,
            }
        })
        .collect())
}

impl Engine {
    /// Receive a shipment: `stock += quantity` and one inbound row stamped
    /// now.
    pub async fn receive_stock(&self, cmd: ReceiveStockCmd) -> ResultEngine<InboundRecord> {
        ensure_positive_quantity(cmd.quantity)?;
        if cmd.unit_price.is_negative() {
            return Err(EngineError::InvalidAmount(
                "unit price must be >= 0".to_string(),
            ));
        }
        let now = Utc::now();

        with_tx!(self, |db_tx| {
            if let Some(supplier_id) = cmd.supplier_id
                && suppliers::Entity::find_by_id(supplier_id)
                    .one(&db_tx)
                    .await?
                    .is_none()
            {
                return Err(EngineError::KeyNotFound("supplier not exists".to_string()));
            }
            if add_stock(&db_tx, cmd.medicine_id, cmd.quantity).await? == 0 {
                warn!(medicine_id = cmd.medicine_id, "receive rejected: unknown medicine");
                return Err(EngineError::KeyNotFound("medicine not exists".to_string()));
            }

            let model = inbounds::ActiveModel {
                id: ActiveValue::NotSet,
                medicine_id: ActiveValue::Set(cmd.medicine_id),
                supplier_id: ActiveValue::Set(cmd.supplier_id),
                quantity: ActiveValue::Set(cmd.quantity),
                unit_price_minor: ActiveValue::Set(cmd.unit_price.cents()),
                inbound_date: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            debug!(
                inbound_id = model.id,
                medicine_id = cmd.medicine_id,
                quantity = cmd.quantity,
                unit_price = %cmd.unit_price,
                "stock received"
            );
            Ok(InboundRecord::from(model))
        })
    }

    /// Sell: `stock -= quantity` if enough is on hand, and one sale row with
    /// a fresh order id and `total = price * quantity`.
    pub async fn sell_stock(&self, cmd: SellStockCmd) -> ResultEngine<SaleRecord> {
        ensure_positive_quantity(cmd.quantity)?;
        let now = Utc::now();

        with_tx!(self, |db_tx| {
            if let Some(customer_id) = cmd.customer_id
                && customers::Entity::find_by_id(customer_id)
                    .one(&db_tx)
                    .await?
                    .is_none()
            {
                return Err(EngineError::KeyNotFound("customer not exists".to_string()));
            }
            let medicine = require_medicine(&db_tx, cmd.medicine_id).await?;
            let total = crate::MoneyCents::new(medicine.price_minor)
                .checked_mul(cmd.quantity)
                .ok_or_else(|| EngineError::InvalidAmount("sale total overflows".to_string()))?;

            // The stock read above may already be stale; only the conditional
            // decrement decides.
            if take_stock(&db_tx, cmd.medicine_id, cmd.quantity).await? == 0 {
                let err = shortage_error(&db_tx, cmd.medicine_id, cmd.quantity).await?;
                warn!(medicine_id = cmd.medicine_id, quantity = cmd.quantity, error = %err, "sale rejected");
                return Err(err);
            }

            let model = sales::ActiveModel {
                id: ActiveValue::NotSet,
                order_id: ActiveValue::Set(sales::new_order_id(now)),
                medicine_id: ActiveValue::Set(cmd.medicine_id),
                customer_id: ActiveValue::Set(cmd.customer_id),
                quantity: ActiveValue::Set(cmd.quantity),
                total_price_minor: ActiveValue::Set(total.cents()),
                sale_date: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            debug!(
                sale_id = model.id,
                order_id = %model.order_id,
                medicine_id = cmd.medicine_id,
                quantity = cmd.quantity,
                total = %total,
                stock_before = medicine.stock,
                "stock sold"
            );
            Ok(SaleRecord::from(model))
        })
    }

    /// Undo a sale: the row disappears and its quantity goes back on stock.
    pub async fn reverse_sale(&self, sale_id: i64) -> ResultEngine<SaleReversal> {
        with_tx!(self, |db_tx| {
            let sale = sales::Entity::find_by_id(sale_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("sale not exists".to_string()))?;

            // Deleting first makes a concurrent second reversal fail here.
            let deleted = sales::Entity::delete_by_id(sale_id).exec(&db_tx).await?;
            if deleted.rows_affected == 0 {
                return Err(EngineError::KeyNotFound("sale not exists".to_string()));
            }
            if add_stock(&db_tx, sale.medicine_id, sale.quantity).await? == 0 {
                return Err(EngineError::KeyNotFound("medicine not exists".to_string()));
            }

            debug!(
                sale_id,
                medicine_id = sale.medicine_id,
                quantity = sale.quantity,
                "sale reversed"
            );
            Ok(SaleReversal {
                sale_id,
                medicine_id: sale.medicine_id,
                quantity: sale.quantity,
                refund_amount: crate::MoneyCents::new(sale.total_price_minor),
            })
        })
    }

    /// Return a shipment to its supplier: the row disappears and its
    /// quantity leaves stock, provided that much is still on hand.
    pub async fn reverse_purchase(&self, inbound_id: i64) -> ResultEngine<PurchaseReversal> {
        with_tx!(self, |db_tx| {
            let inbound = inbounds::Entity::find_by_id(inbound_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("inbound not exists".to_string()))?;

            if take_stock(&db_tx, inbound.medicine_id, inbound.quantity).await? == 0 {
                let err = shortage_error(&db_tx, inbound.medicine_id, inbound.quantity).await?;
                warn!(inbound_id, error = %err, "purchase return rejected");
                return Err(err);
            }
            // A concurrent return of the same row got here first.
            let deleted = inbounds::Entity::delete_by_id(inbound_id)
                .exec(&db_tx)
                .await?;
            if deleted.rows_affected == 0 {
                return Err(EngineError::KeyNotFound("inbound not exists".to_string()));
            }

            debug!(
                inbound_id,
                medicine_id = inbound.medicine_id,
                quantity = inbound.quantity,
                "purchase reversed"
            );
            Ok(PurchaseReversal {
                inbound_id,
                medicine_id: inbound.medicine_id,
                quantity: inbound.quantity,
            })
        })
    }

    /// Overwrite the stock counter after a physical count. No ledger row is
    /// written; the adjustment is a resynchronization point.
    pub async fn adjust_stock(&self, medicine_id: i64, new_stock: i64) -> ResultEngine<StockAdjustment> {
        if new_stock < 0 {
            return Err(EngineError::InvalidAmount(format!(
                "stock must be >= 0, got {new_stock}"
            )));
        }

        with_tx!(self, |db_tx| {
            let medicine = medicines::Entity::find_by_id(medicine_id)
                .lock_exclusive()
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("medicine not exists".to_string()))?;
            let old_stock = medicine.stock;

            // MySQL reports 0 affected rows when the value is unchanged, so
            // the result is not checked; the row is locked above.
            medicines::Entity::update_many()
                .col_expr(medicines::Column::Stock, Expr::value(new_stock))
                .filter(medicines::Column::Id.eq(medicine_id))
                .exec(&db_tx)
                .await?;

            debug!(medicine_id, old_stock, new_stock, "stock adjusted");
            Ok(StockAdjustment {
                medicine_id,
                old_stock,
                new_stock,
                difference: new_stock - old_stock,
            })
        })
    }

    /// Inbound rows, newest first.
    pub async fn list_inbounds(&self, range: DateRange) -> ResultEngine<Vec<InboundDetail>> {
        inbound_details(&self.database, range).await
    }

    /// Sale rows, newest first.
    pub async fn list_sales(&self, range: DateRange) -> ResultEngine<Vec<SaleDetail>> {
        sale_details(&self.database, range).await
    }

    /// One medicine's current stock, read fresh from storage.
    pub async fn stock_of(&self, medicine_id: i64) -> ResultEngine<i64> {
        Ok(require_medicine(&self.database, medicine_id).await?.stock)
    }
}
