//! Inbound ledger rows: every committed row increased the stock of its
//! medicine by `quantity`.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::MoneyCents;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundRecord {
    pub id: i64,
    pub medicine_id: i64,
    pub supplier_id: Option<i64>,
    pub quantity: i64,
    #[serde(rename = "unit_price_minor")]
    pub unit_price: MoneyCents,
    pub inbound_date: DateTime<Utc>,
}

impl InboundRecord {
    /// Cost of the whole shipment (`unit_price * quantity`), saturating.
    #[must_use]
    pub fn amount(&self) -> MoneyCents {
        self.unit_price
            .checked_mul(self.quantity)
            .unwrap_or(MoneyCents::new(i64::MAX))
    }
}

/// An inbound row together with the names of what it refers to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundDetail {
    #[serde(flatten)]
    pub record: InboundRecord,
    pub medicine_name: Option<String>,
    pub supplier_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "inbounds")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub medicine_id: i64,
    pub supplier_id: Option<i64>,
    pub quantity: i64,
    pub unit_price_minor: i64,
    pub inbound_date: DateTimeUtc,
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
        belongs_to = "super::suppliers::Entity",
        from = "Column::SupplierId",
        to = "super::suppliers::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Suppliers,
}

impl Related<super::medicines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Medicines.def()
    }
}

impl Related<super::suppliers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Suppliers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&InboundRecord> for ActiveModel {
    fn from(value: &InboundRecord) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            medicine_id: ActiveValue::Set(value.medicine_id),
            supplier_id: ActiveValue::Set(value.supplier_id),
            quantity: ActiveValue::Set(value.quantity),
            unit_price_minor: ActiveValue::Set(value.unit_price.cents()),
            inbound_date: ActiveValue::Set(value.inbound_date),
        }
    }
}

impl From<Model> for InboundRecord {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            medicine_id: model.medicine_id,
            supplier_id: model.supplier_id,
            quantity: model.quantity,
            unit_price: MoneyCents::new(model.unit_price_minor),
            inbound_date: model.inbound_date,
        }
    }
}
