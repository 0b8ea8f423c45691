use sea_orm::{
    ActiveValue, Condition, IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder,
    TransactionTrait, prelude::*,
};

use crate::{
    EngineError, Medicine, MedicineUpdate, NewMedicine, ResultEngine, inbounds, medicines, sales,
    util::{like_pattern, normalize_optional_text, normalize_required},
};

use super::{Engine, with_tx};

impl Engine {
    /// All medicines ordered by id, optionally filtered by a `LIKE` match on
    /// name or code.
    pub async fn list_medicines(&self, search: Option<&str>) -> ResultEngine<Vec<Medicine>> {
        let mut query = medicines::Entity::find().order_by_asc(medicines::Column::Id);
        if let Some(keyword) = search.map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = like_pattern(keyword);
            query = query.filter(
                Condition::any()
                    .add(medicines::Column::Name.like(pattern.clone()))
                    .add(medicines::Column::Code.like(pattern)),
            );
        }
        query
            .all(&self.database)
            .await?
            .into_iter()
            .map(Medicine::try_from)
            .collect()
    }

    pub async fn medicine(&self, medicine_id: i64) -> ResultEngine<Medicine> {
        let model = medicines::Entity::find_by_id(medicine_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("medicine not exists".to_string()))?;
        Medicine::try_from(model)
    }

    /// Add a medicine. The code must be unique; `stock` is the opening
    /// balance.
    pub async fn create_medicine(&self, cmd: NewMedicine) -> ResultEngine<Medicine> {
        let code = normalize_required(&cmd.code, "medicine code")?;
        let name = normalize_required(&cmd.name, "medicine name")?;
        let kind = normalize_required(&cmd.kind, "medicine type")?;
        if cmd.price.is_negative() {
            return Err(EngineError::InvalidAmount("price must be >= 0".to_string()));
        }
        if cmd.stock < 0 {
            return Err(EngineError::InvalidAmount("stock must be >= 0".to_string()));
        }

        with_tx!(self, |db_tx| {
            let exists = medicines::Entity::find()
                .filter(medicines::Column::Code.eq(code.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(code));
            }

            let model = medicines::ActiveModel {
                id: ActiveValue::NotSet,
                code: ActiveValue::Set(code),
                name: ActiveValue::Set(name),
                kind: ActiveValue::Set(kind),
                spec: ActiveValue::Set(normalize_optional_text(cmd.spec.as_deref())),
                price_minor: ActiveValue::Set(cmd.price.cents()),
                stock: ActiveValue::Set(cmd.stock),
                manufacturer: ActiveValue::Set(normalize_optional_text(cmd.manufacturer.as_deref())),
                status: ActiveValue::Set(cmd.status.as_str().to_string()),
            }
            .insert(&db_tx)
            .await?;
            Medicine::try_from(model)
        })
    }

    /// Update descriptive fields. Stock is left alone: it only moves through
    /// the ledger or [`Engine::adjust_stock`].
    pub async fn update_medicine(
        &self,
        medicine_id: i64,
        update: MedicineUpdate,
    ) -> ResultEngine<Medicine> {
        if update.price.is_some_and(|p| p.is_negative()) {
            return Err(EngineError::InvalidAmount("price must be >= 0".to_string()));
        }

        with_tx!(self, |db_tx| {
            let model = medicines::Entity::find_by_id(medicine_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("medicine not exists".to_string()))?;
            let mut active = model.into_active_model();

            if let Some(code) = update.code.as_deref() {
                let code = normalize_required(code, "medicine code")?;
                let taken = medicines::Entity::find()
                    .filter(medicines::Column::Code.eq(code.clone()))
                    .filter(medicines::Column::Id.ne(medicine_id))
                    .one(&db_tx)
                    .await?
                    .is_some();
                if taken {
                    return Err(EngineError::ExistingKey(code));
                }
                active.code = ActiveValue::Set(code);
            }
            if let Some(name) = update.name.as_deref() {
                active.name = ActiveValue::Set(normalize_required(name, "medicine name")?);
            }
            if let Some(kind) = update.kind.as_deref() {
                active.kind = ActiveValue::Set(normalize_required(kind, "medicine type")?);
            }
            if let Some(spec) = update.spec.as_deref() {
                active.spec = ActiveValue::Set(normalize_optional_text(Some(spec)));
            }
            if let Some(price) = update.price {
                active.price_minor = ActiveValue::Set(price.cents());
            }
            if let Some(manufacturer) = update.manufacturer.as_deref() {
                active.manufacturer = ActiveValue::Set(normalize_optional_text(Some(manufacturer)));
            }
            if let Some(status) = update.status {
                active.status = ActiveValue::Set(status.as_str().to_string());
            }

            let model = active.update(&db_tx).await?;
            Medicine::try_from(model)
        })
    }

    /// Delete a medicine that no ledger row refers to.
    pub async fn delete_medicine(&self, medicine_id: i64) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            medicines::Entity::find_by_id(medicine_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("medicine not exists".to_string()))?;

            let inbound_rows = inbounds::Entity::find()
                .filter(inbounds::Column::MedicineId.eq(medicine_id))
                .count(&db_tx)
                .await?;
            let sale_rows = sales::Entity::find()
                .filter(sales::Column::MedicineId.eq(medicine_id))
                .count(&db_tx)
                .await?;
            if inbound_rows + sale_rows > 0 {
                return Err(EngineError::Referenced("medicine".to_string()));
            }

            medicines::Entity::delete_by_id(medicine_id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }
}
