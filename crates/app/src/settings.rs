//! Handles settings for the application. Configuration is read from an
//! optional `settings.toml` and `PHARMACY__*` environment variables, e.g.
//! `PHARMACY__SERVER__PORT=9000`.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: String,
    pub port: u16,
    /// `memory`, a sqlite file path, or a full `sqlite:`/`mysql://` URL.
    pub database: String,
    /// Where the connection settings chosen from the front end are kept.
    pub database_file: String,
}

impl Server {
    /// Connection URL for [`Server::database`].
    pub fn database_url(&self) -> String {
        let database = self.database.trim();
        if database == "memory" {
            "sqlite::memory:".to_string()
        } else if database.starts_with("sqlite:") || database.starts_with("mysql://") {
            database.to_string()
        } else {
            format!("sqlite:{database}?mode=rwc")
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Server,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("app.level", "info")?
            .set_default("server.bind", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.database", "memory")?
            .set_default("server.database_file", "database.json")?
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("PHARMACY").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
