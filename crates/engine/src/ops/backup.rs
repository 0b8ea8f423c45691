use chrono::Utc;
use sea_orm::{
    ConnectionTrait, DatabaseTransaction, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use tracing::info;

use crate::{
    EngineError, Medicine, ResultEngine, Snapshot, SnapshotFormat,
    backup::{check_statement, split_statements},
    customers, inbounds, medicines, sales, suppliers,
};

use super::{Engine, with_tx};

/// Rows per multi-row `INSERT`, well below SQLite's bind parameter limit.
const INSERT_CHUNK: usize = 500;

/// Delete every backup table, children first.
async fn wipe(db_tx: &DatabaseTransaction) -> ResultEngine<()> {
    sales::Entity::delete_many().exec(db_tx).await?;
    inbounds::Entity::delete_many().exec(db_tx).await?;
    medicines::Entity::delete_many().exec(db_tx).await?;
    customers::Entity::delete_many().exec(db_tx).await?;
    suppliers::Entity::delete_many().exec(db_tx).await?;
    Ok(())
}

async fn insert_chunked<A>(db_tx: &DatabaseTransaction, models: Vec<A>) -> ResultEngine<()>
where
    A: ActiveModelTrait + Send,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
{
    let mut models = models.into_iter().peekable();
    while models.peek().is_some() {
        let chunk: Vec<A> = models.by_ref().take(INSERT_CHUNK).collect();
        <A::Entity as EntityTrait>::insert_many(chunk)
            .exec_without_returning(db_tx)
            .await?;
    }
    Ok(())
}

/// Stock may never be negative, whatever the backup says.
async fn ensure_stock_invariant(db_tx: &DatabaseTransaction) -> ResultEngine<()> {
    let negative = medicines::Entity::find()
        .filter(medicines::Column::Stock.lt(0))
        .count(db_tx)
        .await?;
    if negative > 0 {
        return Err(EngineError::Backup(format!(
            "{negative} medicines would have negative stock"
        )));
    }
    Ok(())
}

impl Engine {
    /// Read every backup table in one transaction.
    pub async fn snapshot(&self) -> ResultEngine<Snapshot> {
        with_tx!(self, |db_tx| {
            let suppliers = suppliers::Entity::find()
                .order_by_asc(suppliers::Column::Id)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Into::into)
                .collect();
            let customers = customers::Entity::find()
                .order_by_asc(customers::Column::Id)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Into::into)
                .collect();
            let medicines = medicines::Entity::find()
                .order_by_asc(medicines::Column::Id)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Medicine::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            let inbounds = inbounds::Entity::find()
                .order_by_asc(inbounds::Column::Id)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Into::into)
                .collect();
            let sales = sales::Entity::find()
                .order_by_asc(sales::Column::Id)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Into::into)
                .collect();

            Ok(Snapshot {
                created_at: Utc::now(),
                suppliers,
                customers,
                medicines,
                inbounds,
                sales,
            })
        })
    }

    /// Serialize a fresh snapshot in `format`.
    pub async fn export(&self, format: SnapshotFormat) -> ResultEngine<String> {
        let snapshot = self.snapshot().await?;
        match format {
            SnapshotFormat::Json => serde_json::to_string_pretty(&snapshot)
                .map_err(|err| EngineError::Backup(err.to_string())),
            SnapshotFormat::Sql => Ok(snapshot.to_sql(self.backend())),
        }
    }

    /// Replace every backup table with the content of `snapshot`.
    pub async fn restore_snapshot(&self, snapshot: Snapshot) -> ResultEngine<()> {
        if let Some(bad) = snapshot.medicines.iter().find(|m| m.stock < 0) {
            return Err(EngineError::Backup(format!(
                "medicine {} has negative stock",
                bad.code
            )));
        }

        with_tx!(self, |db_tx| {
            wipe(&db_tx).await?;
            insert_chunked(
                &db_tx,
                snapshot
                    .suppliers
                    .iter()
                    .map(suppliers::ActiveModel::from)
                    .collect(),
            )
            .await?;
            insert_chunked(
                &db_tx,
                snapshot
                    .customers
                    .iter()
                    .map(customers::ActiveModel::from)
                    .collect(),
            )
            .await?;
            insert_chunked(
                &db_tx,
                snapshot
                    .medicines
                    .iter()
                    .map(medicines::ActiveModel::from)
                    .collect(),
            )
            .await?;
            insert_chunked(
                &db_tx,
                snapshot
                    .inbounds
                    .iter()
                    .map(inbounds::ActiveModel::from)
                    .collect(),
            )
            .await?;
            insert_chunked(
                &db_tx,
                snapshot.sales.iter().map(sales::ActiveModel::from).collect(),
            )
            .await?;

            info!(
                medicines = snapshot.medicines.len(),
                inbounds = snapshot.inbounds.len(),
                sales = snapshot.sales.len(),
                "snapshot restored"
            );
            Ok(())
        })
    }

    /// Parse a JSON snapshot and restore it.
    pub async fn restore_json(&self, body: &str) -> ResultEngine<()> {
        let snapshot: Snapshot = serde_json::from_str(body)
            .map_err(|err| EngineError::Backup(format!("invalid backup document: {err}")))?;
        self.restore_snapshot(snapshot).await
    }

    /// Run a SQL backup script. Tables are wiped first; only `DELETE FROM`
    /// and `INSERT INTO` statements on backup tables are accepted.
    pub async fn restore_sql(&self, script: &str) -> ResultEngine<()> {
        let statements = split_statements(script, self.backend())?;
        for statement in &statements {
            check_statement(statement)?;
        }

        with_tx!(self, |db_tx| {
            wipe(&db_tx).await?;
            for statement in &statements {
                db_tx.execute_unprepared(statement).await?;
            }
            ensure_stock_invariant(&db_tx).await?;
            info!(statements = statements.len(), "sql backup restored");
            Ok(())
        })
    }
}
