use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;
use sea_orm::DbErr;

use serde::Serialize;
pub use database_config::{load as load_database_config, save as save_database_config};
pub use server::{ServerState, router, run_with_listener, spawn_with_listener};

mod analysis;
mod auth;
mod customers;
mod database_config;
mod extract;
mod medicines;
mod reports;
mod search;
mod server;
mod stock;
mod suppliers;
mod system;
mod users;

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    Generic(String),
    /// No database is connected yet.
    Disconnected,
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        EngineError::ExistingKey(_) | EngineError::Referenced(_) => StatusCode::CONFLICT,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::KeyNotFound(_)
        | EngineError::InvalidAmount(_)
        | EngineError::InsufficientStock(_)
        | EngineError::InvalidId(_)
        | EngineError::Backup(_) => StatusCode::BAD_REQUEST,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
            ServerError::Disconnected => (
                StatusCode::SERVICE_UNAVAILABLE,
                "database not connected".to_string(),
            ),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<DbErr> for ServerError {
    fn from(value: DbErr) -> Self {
        Self::Engine(EngineError::Database(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_not_found_maps_to_400() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn insufficient_stock_maps_to_400() {
        let res =
            ServerError::from(EngineError::InsufficientStock("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn engine_conflict_maps_to_409() {
        let res = ServerError::from(EngineError::ExistingKey("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
        let res = ServerError::from(EngineError::Referenced("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn unauthorized_maps_to_401() {
        let res = ServerError::from(EngineError::Unauthorized("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn database_error_maps_to_500() {
        let res = ServerError::from(DbErr::Custom("boom".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn disconnected_maps_to_503() {
        let res = ServerError::Disconnected.into_response();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
