//! Sale ledger rows: every committed row decreased the stock of its medicine
//! by `quantity`.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::MoneyCents;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: i64,
    /// Unique human-readable order number, see [`new_order_id`].
    pub order_id: String,
    pub medicine_id: i64,
    pub customer_id: Option<i64>,
    pub quantity: i64,
    /// Medicine price at the time of sale multiplied by `quantity`.
    #[serde(rename = "total_price_minor")]
    pub total_price: MoneyCents,
    pub sale_date: DateTime<Utc>,
}

/// A sale row together with the names of what it refers to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleDetail {
    #[serde(flatten)]
    pub record: SaleRecord,
    pub medicine_name: Option<String>,
    pub customer_name: Option<String>,
}

/// Generate an order id: `ORD-<UTC timestamp>-<random suffix>`.
///
/// The random suffix keeps two sales in the same second distinct; the
/// unique index on `sales.order_id` backs it up.
pub(crate) fn new_order_id(now: DateTime<Utc>) -> String {
    format!(
        "ORD-{}-{}",
        now.format("%Y%m%d%H%M%S"),
        Uuid::new_v4().simple()
    )
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub order_id: String,
    pub medicine_id: i64,
    pub customer_id: Option<i64>,
    pub quantity: i64,
    pub total_price_minor: i64,
    pub sale_date: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::medicines::Entity",
        from = "Column::MedicineId",
        to = "super::medicines::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Medicines,
    #[sea_orm(
        belongs_to = "super::customers::Entity",
        from = "Column::CustomerId",
        to = "super::customers::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Customers,
}

impl Related<super::medicines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Medicines.def()
    }
}

impl Related<super::customers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&SaleRecord> for ActiveModel {
    fn from(value: &SaleRecord) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            order_id: ActiveValue::Set(value.order_id.clone()),
            medicine_id: ActiveValue::Set(value.medicine_id),
            customer_id: ActiveValue::Set(value.customer_id),
            quantity: ActiveValue::Set(value.quantity),
            total_price_minor: ActiveValue::Set(value.total_price.cents()),
            sale_date: ActiveValue::Set(value.sale_date),
        }
    }
}

impl From<Model> for SaleRecord {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            medicine_id: model.medicine_id,
            customer_id: model.customer_id,
            quantity: model.quantity,
            total_price: MoneyCents::new(model.total_price_minor),
            sale_date: model.sale_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn order_id_carries_timestamp_and_is_unique() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 5).unwrap();
        let a = new_order_id(now);
        let b = new_order_id(now);
        assert!(a.starts_with("ORD-20260301093005-"));
        assert_ne!(a, b);
    }
}
