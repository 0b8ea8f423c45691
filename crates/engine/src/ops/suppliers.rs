use chrono::Utc;
use sea_orm::{
    ActiveValue, Condition, IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder,
    TransactionTrait, prelude::*,
};

use crate::{
    EngineError, NewSupplier, ResultEngine, Supplier, SupplierUpdate, inbounds, suppliers,
    util::{like_pattern, normalize_optional_text, normalize_required},
};

use super::{Engine, with_tx};

impl Engine {
    pub async fn list_suppliers(&self) -> ResultEngine<Vec<Supplier>> {
        Ok(suppliers::Entity::find()
            .order_by_asc(suppliers::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Supplier::from)
            .collect())
    }

    /// Suppliers whose name or contact person contains `keyword`.
    pub async fn search_suppliers(&self, keyword: &str) -> ResultEngine<Vec<Supplier>> {
        let pattern = like_pattern(keyword);
        Ok(suppliers::Entity::find()
            .filter(
                Condition::any()
                    .add(suppliers::Column::Name.like(pattern.clone()))
                    .add(suppliers::Column::Contact.like(pattern)),
            )
            .order_by_asc(suppliers::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Supplier::from)
            .collect())
    }

    pub async fn create_supplier(&self, cmd: NewSupplier) -> ResultEngine<Supplier> {
        let name = normalize_required(&cmd.name, "supplier name")?;
        let model = suppliers::ActiveModel {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(name),
            contact: ActiveValue::Set(normalize_optional_text(cmd.contact.as_deref())),
            phone: ActiveValue::Set(normalize_optional_text(cmd.phone.as_deref())),
            created_at: ActiveValue::Set(Utc::now()),
        }
        .insert(&self.database)
        .await?;
        Ok(model.into())
    }

    pub async fn update_supplier(
        &self,
        supplier_id: i64,
        update: SupplierUpdate,
    ) -> ResultEngine<Supplier> {
        with_tx!(self, |db_tx| {
            let model = suppliers::Entity::find_by_id(supplier_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("supplier not exists".to_string()))?;
            let mut active = model.into_active_model();
            if let Some(name) = update.name.as_deref() {
                active.name = ActiveValue::Set(normalize_required(name, "supplier name")?);
            }
            if let Some(contact) = update.contact.as_deref() {
                active.contact = ActiveValue::Set(normalize_optional_text(Some(contact)));
            }
            if let Some(phone) = update.phone.as_deref() {
                active.phone = ActiveValue::Set(normalize_optional_text(Some(phone)));
            }
            Ok(active.update(&db_tx).await?.into())
        })
    }

    /// Delete a supplier no inbound row refers to.
    pub async fn delete_supplier(&self, supplier_id: i64) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            suppliers::Entity::find_by_id(supplier_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("supplier not exists".to_string()))?;
            let referenced = inbounds::Entity::find()
                .filter(inbounds::Column::SupplierId.eq(supplier_id))
                .count(&db_tx)
                .await?;
            if referenced > 0 {
                return Err(EngineError::Referenced("supplier".to_string()));
            }
            suppliers::Entity::delete_by_id(supplier_id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }
}
