use chrono::Utc;
use sea_orm::{
    ActiveValue, Condition, IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder,
    TransactionTrait, prelude::*,
};

use crate::{
    Customer, CustomerUpdate, EngineError, NewCustomer, ResultEngine, customers, sales,
    util::{like_pattern, normalize_optional_text, normalize_required},
};

use super::{Engine, with_tx};

impl Engine {
    pub async fn list_customers(&self) -> ResultEngine<Vec<Customer>> {
        Ok(customers::Entity::find()
            .order_by_asc(customers::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Customer::from)
            .collect())
    }

    /// Customers whose name or phone contains `keyword`.
    pub async fn search_customers(&self, keyword: &str) -> ResultEngine<Vec<Customer>> {
        let pattern = like_pattern(keyword);
        Ok(customers::Entity::find()
            .filter(
                Condition::any()
                    .add(customers::Column::Name.like(pattern.clone()))
                    .add(customers::Column::Phone.like(pattern)),
            )
            .order_by_asc(customers::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Customer::from)
            .collect())
    }

    pub async fn create_customer(&self, cmd: NewCustomer) -> ResultEngine<Customer> {
        let name = normalize_required(&cmd.name, "customer name")?;
        let model = customers::ActiveModel {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(name),
            phone: ActiveValue::Set(normalize_optional_text(cmd.phone.as_deref())),
            created_at: ActiveValue::Set(Utc::now()),
        }
        .insert(&self.database)
        .await?;
        Ok(model.into())
    }

    pub async fn update_customer(
        &self,
        customer_id: i64,
        update: CustomerUpdate,
    ) -> ResultEngine<Customer> {
        with_tx!(self, |db_tx| {
            let model = customers::Entity::find_by_id(customer_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("customer not exists".to_string()))?;
            let mut active = model.into_active_model();
            if let Some(name) = update.name.as_deref() {
                active.name = ActiveValue::Set(normalize_required(name, "customer name")?);
            }
            if let Some(phone) = update.phone.as_deref() {
                active.phone = ActiveValue::Set(normalize_optional_text(Some(phone)));
            }
            Ok(active.update(&db_tx).await?.into())
        })
    }

    /// Delete a customer no sale refers to.
    pub async fn delete_customer(&self, customer_id: i64) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            customers::Entity::find_by_id(customer_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("customer not exists".to_string()))?;
            let referenced = sales::Entity::find()
                .filter(sales::Column::CustomerId.eq(customer_id))
                .count(&db_tx)
                .await?;
            if referenced > 0 {
                return Err(EngineError::Referenced("customer".to_string()));
            }
            customers::Entity::delete_by_id(customer_id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }
}
