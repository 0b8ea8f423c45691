//! Medicine catalog entries.
//!
//! `stock` is the denormalized on-hand quantity. It is only ever changed by
//! the stock ledger operations (or an explicit adjustment) and never goes
//! below zero.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{EngineError, MoneyCents, ResultEngine};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MedicineStatus {
    #[default]
    Active,
    Inactive,
}

impl MedicineStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl TryFrom<&str> for MedicineStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid medicine status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medicine {
    pub id: i64,
    pub code: String,
    pub name: String,
    /// Dosage form / category ("tablet", "syrup", ...).
    #[serde(rename = "type")]
    pub kind: String,
    pub spec: Option<String>,
    #[serde(rename = "price_minor")]
    pub price: MoneyCents,
    pub stock: i64,
    pub manufacturer: Option<String>,
    pub status: MedicineStatus,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "medicines")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    #[sea_orm(column_name = "type")]
    pub kind: String,
    pub spec: Option<String>,
    pub price_minor: i64,
    pub stock: i64,
    pub manufacturer: Option<String>,
    pub status: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::inbounds::Entity")]
    Inbounds,
    #[sea_orm(has_many = "super::sales::Entity")]
    Sales,
}

impl Related<super::inbounds::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Inbounds.def()
    }
}

impl Related<super::sales::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sales.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Medicine> for ActiveModel {
    fn from(value: &Medicine) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            code: ActiveValue::Set(value.code.clone()),
            name: ActiveValue::Set(value.name.clone()),
            kind: ActiveValue::Set(value.kind.clone()),
            spec: ActiveValue::Set(value.spec.clone()),
            price_minor: ActiveValue::Set(value.price.cents()),
            stock: ActiveValue::Set(value.stock),
            manufacturer: ActiveValue::Set(value.manufacturer.clone()),
            status: ActiveValue::Set(value.status.as_str().to_string()),
        }
    }
}

impl TryFrom<Model> for Medicine {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            code: model.code,
            name: model.name,
            kind: model.kind,
            spec: model.spec,
            price: MoneyCents::new(model.price_minor),
            stock: model.stock,
            manufacturer: model.manufacturer,
            status: MedicineStatus::try_from(model.status.as_str())?,
        })
    }
}
