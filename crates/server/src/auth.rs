//! Login endpoint.
//!
//! Tokens are placeholders; no endpoint checks them.

use api_types::auth::{LoginRequest, LoginResponse, LoginUser};
use axum::{Json, extract::State};
use engine::{DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USERNAME, EngineError, Role};

use crate::{ServerError, extract::JsonBody, server::ServerState};

pub async fn login(
    State(state): State<ServerState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, ServerError> {
    let engine = match state.engine().await {
        Ok(engine) => engine,
        // Without a database only the default admin may log in, so the
        // connection can be configured from the front end.
        Err(ServerError::Disconnected) => {
            if payload.username == DEFAULT_ADMIN_USERNAME
                && payload.password == DEFAULT_ADMIN_PASSWORD
            {
                tracing::info!("offline login as {DEFAULT_ADMIN_USERNAME}");
                return Ok(Json(LoginResponse {
                    message: "login successful (offline)".to_string(),
                    token: "offline-token".to_string(),
                    user: LoginUser {
                        id: 0,
                        username: DEFAULT_ADMIN_USERNAME.to_string(),
                        role: Role::Admin.as_str().to_string(),
                    },
                }));
            }
            return Err(EngineError::Unauthorized("database not connected".to_string()).into());
        }
        Err(err) => return Err(err),
    };

    let user = engine
        .authenticate(payload.username.trim(), &payload.password)
        .await?;

    Ok(Json(LoginResponse {
        message: "login successful".to_string(),
        token: "dummy-token".to_string(),
        user: LoginUser {
            id: user.id,
            username: user.username,
            role: user.role.as_str().to_string(),
        },
    }))
}
