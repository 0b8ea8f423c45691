use axum::{
    Router,
    routing::{get, post, put},
};
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    ServerError, analysis, auth, customers, medicines, reports, search, stock, suppliers, system,
    users,
};
use engine::Engine;

/// Shared handler state.
///
/// The engine is `None` until a database is connected; it is swapped as a
/// whole when the connection is reconfigured.
#[derive(Clone)]
pub struct ServerState {
    engine: Arc<RwLock<Option<Engine>>>,
    database_file: Arc<PathBuf>,
}

impl ServerState {
    /// `database_file` is where the connection settings are persisted.
    pub fn new(engine: Option<Engine>, database_file: impl Into<PathBuf>) -> Self {
        Self {
            engine: Arc::new(RwLock::new(engine)),
            database_file: Arc::new(database_file.into()),
        }
    }

    /// The live engine, or [`ServerError::Disconnected`].
    pub(crate) async fn engine(&self) -> Result<Engine, ServerError> {
        self.engine
            .read()
            .await
            .clone()
            .ok_or(ServerError::Disconnected)
    }

    pub(crate) async fn is_connected(&self) -> bool {
        self.engine.read().await.is_some()
    }

    pub(crate) async fn replace_engine(&self, engine: Engine) {
        *self.engine.write().await = Some(engine);
    }

    pub(crate) fn database_file(&self) -> &Path {
        &self.database_file
    }
}

fn api() -> Router<ServerState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/dashboard/stats", get(reports::dashboard))
        .route("/users", get(users::list).post(users::create))
        .route("/users/{id}", put(users::update).delete(users::delete))
        .route("/medicines", get(medicines::list).post(medicines::create))
        .route(
            "/medicines/{id}",
            get(medicines::get)
                .put(medicines::update)
                .delete(medicines::delete),
        )
        .route("/customers", get(customers::list).post(customers::create))
        .route(
            "/customers/{id}",
            put(customers::update).delete(customers::delete),
        )
        .route("/suppliers", get(suppliers::list).post(suppliers::create))
        .route(
            "/suppliers/{id}",
            put(suppliers::update).delete(suppliers::delete),
        )
        .route("/inbounds", get(stock::list_inbounds).post(stock::receive))
        .route("/sales", get(stock::list_sales).post(stock::sell))
        .route("/returns/sales", post(stock::return_sale))
        .route("/returns/purchase", post(stock::return_purchase))
        .route("/stock/adjust", post(stock::adjust))
        .route("/reports/inbound", get(reports::inbound))
        .route("/reports/sales", get(reports::sales))
        .route("/reports/inventory", get(reports::inventory))
        .route("/reports/financial", get(reports::financial))
        .route("/analysis/trend", get(analysis::trend))
        .route("/analysis/top-selling", get(analysis::top_selling))
        .route("/search/users", get(search::users))
        .route("/search/customers", get(search::customers))
        .route("/search/suppliers", get(search::suppliers))
        .route("/system/backup", get(system::backup))
        .route("/system/restore", post(system::restore))
        .route("/system/database/status", get(system::database_status))
        .route(
            "/system/database",
            get(system::database_config).post(system::update_database),
        )
        .route("/system/database/test", post(system::test_database))
}

/// The full application router: every endpoint under `/api`, with
/// permissive CORS for the browser front end.
pub fn router(state: ServerState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api())
        .layer(cors)
        .with_state(state)
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(state, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
