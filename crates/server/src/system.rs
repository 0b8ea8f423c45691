//! Backup, restore and database connection API endpoints.

use api_types::{
    Message,
    system::{BackupQuery, DatabaseConfig, DatabaseStatus},
};
use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, header},
    response::IntoResponse,
};
use chrono::Utc;
use engine::{Engine, SnapshotFormat};
use migration::{Migrator, MigratorTrait};

use crate::{ServerError, extract::JsonBody, database_config, server::ServerState};

fn content_type(format: SnapshotFormat) -> &'static str {
    match format {
        SnapshotFormat::Json => "application/json",
        SnapshotFormat::Sql => "application/sql",
    }
}

/// Download every business table as a JSON or SQL attachment.
pub async fn backup(
    State(state): State<ServerState>,
    Query(query): Query<BackupQuery>,
) -> Result<impl IntoResponse, ServerError> {
    let format = match query.format.as_deref() {
        Some(format) => SnapshotFormat::try_from(format.trim())?,
        None => SnapshotFormat::default(),
    };
    let body = state.engine().await?.export(format).await?;
    let filename = format!(
        "pharmacy_backup_{}.{}",
        Utc::now().format("%Y%m%d_%H%M%S"),
        format.as_str()
    );

    Ok((
        [
            (header::CONTENT_TYPE, content_type(format).to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    ))
}

fn is_sql_body(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            let mime = value.split(';').next().unwrap_or_default().trim();
            mime.eq_ignore_ascii_case("application/sql") || mime.eq_ignore_ascii_case("text/plain")
        })
        .unwrap_or(false)
}

/// Restore a backup: SQL text for `application/sql` or `text/plain`
/// bodies, a JSON snapshot otherwise.
pub async fn restore(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<Message>, ServerError> {
    let engine = state.engine().await?;
    if is_sql_body(&headers) {
        engine.restore_sql(&body).await?;
    } else {
        engine.restore_json(&body).await?;
    }
    Ok(Json(Message::new("restore completed")))
}

pub async fn database_status(State(state): State<ServerState>) -> Json<DatabaseStatus> {
    Json(DatabaseStatus {
        connected: state.is_connected().await,
    })
}

/// The persisted connection settings (or the defaults), password masked.
pub async fn database_config(
    State(state): State<ServerState>,
) -> Result<Json<DatabaseConfig>, ServerError> {
    let config = database_config::load(state.database_file())
        .map_err(|err| ServerError::Generic(format!("cannot read database config: {err}")))?
        .unwrap_or_default();
    Ok(Json(database_config::masked(config)))
}

async fn connect(config: &DatabaseConfig) -> Result<sea_orm::DatabaseConnection, ServerError> {
    engine::database::open(&database_config::url(config))
        .await
        .map_err(|err| {
            tracing::warn!(host = %config.host, database = %config.database, "database connection failed: {err}");
            ServerError::Generic(format!("database connection failed: {err}"))
        })
}

/// Try the given settings without touching the live connection.
pub async fn test_database(
    JsonBody(payload): JsonBody<DatabaseConfig>,
) -> Result<Json<Message>, ServerError> {
    let db = connect(&payload).await?;
    let ping = db.ping().await;
    let _ = db.close().await;
    ping.map_err(|err| ServerError::Generic(format!("database connection failed: {err}")))?;

    Ok(Json(Message::new("connection successful")))
}

/// Connect to a new database, prepare it, swap it in and persist the
/// settings.
pub async fn update_database(
    State(state): State<ServerState>,
    JsonBody(payload): JsonBody<DatabaseConfig>,
) -> Result<Json<Message>, ServerError> {
    let db = connect(&payload).await?;
    Migrator::up(&db, None).await?;
    let engine = Engine::builder().database(db).build().await?;
    if engine.seed_admin().await? {
        tracing::info!("seeded default admin account");
    }

    state.replace_engine(engine).await;
    tracing::info!(host = %payload.host, database = %payload.database, "database connection replaced");

    database_config::save(state.database_file(), &payload).map_err(|err| {
        tracing::error!("failed to persist database config: {err}");
        ServerError::Generic(format!("connected, but cannot save database config: {err}"))
    })?;

    Ok(Json(Message::new("database connected")))
}
