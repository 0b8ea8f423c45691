use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    /// Contact person.
    pub contact: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "suppliers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub contact: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::inbounds::Entity")]
    Inbounds,
}

impl Related<super::inbounds::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Inbounds.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Supplier> for ActiveModel {
    fn from(value: &Supplier) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            name: ActiveValue::Set(value.name.clone()),
            contact: ActiveValue::Set(value.contact.clone()),
            phone: ActiveValue::Set(value.phone.clone()),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl From<Model> for Supplier {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            contact: model.contact,
            phone: model.phone,
            created_at: model.created_at,
        }
    }
}
