use std::path::Path;

use migration::{Migrator, MigratorTrait};
use server::ServerState;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "pharmacy={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let server_settings = settings.server;
    let database_file = Path::new(&server_settings.database_file);

    // The front end can configure the database later, so a failed connect
    // still starts the server.
    let engine = match connect(&server_settings, database_file).await {
        Ok(engine) => Some(engine),
        Err(err) => {
            tracing::error!("failed to initialize database, starting offline: {err}");
            None
        }
    };

    let addr = format!("{}:{}", server_settings.bind, server_settings.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    server::run_with_listener(ServerState::new(engine, database_file), listener).await?;

    Ok(())
}

/// Connect using the persisted settings when present, the configured URL
/// otherwise, then migrate and seed the admin account.
async fn connect(
    server_settings: &settings::Server,
    database_file: &Path,
) -> Result<engine::Engine, Box<dyn std::error::Error + Send + Sync>> {
    let url = match server::load_database_config(database_file)? {
        Some(config) => {
            tracing::info!(host = %config.host, database = %config.database, "using persisted database config");
            engine::database::mysql_url(
                &config.host,
                config.port,
                &config.user,
                &config.password,
                &config.database,
            )
        }
        None => server_settings.database_url(),
    };

    let database = engine::database::open(&url).await?;
    Migrator::up(&database, None).await?;
    tracing::info!("database connected");

    let engine = engine::Engine::builder().database(database).build().await?;
    if engine.seed_admin().await? {
        tracing::info!("seeded default admin account");
    }
    Ok(engine)
}
