use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend};

use crate::ResultEngine;

mod analysis;
mod backup;
mod customers;
mod ledger;
mod medicines;
mod reports;
mod suppliers;
mod users;

pub use users::{DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USERNAME};

/// Run a block inside a DB transaction, committing on success.
///
/// The transaction guard rolls back when dropped uncommitted, which covers
/// `?` early returns, errors and a cancelled future alike. Inside the block
/// only `$tx` may be used: with a single pooled connection a query on
/// `self.database` would wait forever for the connection the block holds.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// The pharmacy engine.
///
/// Cloning is cheap: clones share the same connection pool.
#[derive(Clone, Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Backend of the underlying connection.
    pub fn backend(&self) -> DbBackend {
        self.database.get_database_backend()
    }

    /// Round-trip a trivial query to check the connection is alive.
    pub async fn ping(&self) -> ResultEngine<()> {
        self.database.ping().await?;
        Ok(())
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
