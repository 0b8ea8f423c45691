//! Back-office accounts API endpoints.

use api_types::{
    Message,
    user::{UserNew, UserUpdate},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{NewUser, Role, User};

use crate::{ServerError, extract::JsonBody, server::ServerState};

fn parse_role(raw: Option<&str>) -> Result<Option<Role>, ServerError> {
    raw.map(|role| Role::try_from(role.trim()).map_err(ServerError::from))
        .transpose()
}

pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<User>>, ServerError> {
    let users = state.engine().await?.list_users().await?;
    Ok(Json(users))
}

pub async fn create(
    State(state): State<ServerState>,
    JsonBody(payload): JsonBody<UserNew>,
) -> Result<(StatusCode, Json<User>), ServerError> {
    let mut cmd = NewUser::new(payload.username, payload.password);
    cmd.real_name = payload.real_name;
    cmd.phone = payload.phone;
    if let Some(role) = parse_role(payload.role.as_deref())? {
        cmd = cmd.role(role);
    }

    let user = state.engine().await?.create_user(cmd).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    JsonBody(payload): JsonBody<UserUpdate>,
) -> Result<Json<User>, ServerError> {
    let update = engine::UserUpdate {
        role: parse_role(payload.role.as_deref())?,
        password: payload.password,
        real_name: payload.real_name,
        phone: payload.phone,
    };

    let user = state.engine().await?.update_user(id, update).await?;
    Ok(Json(user))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<Message>, ServerError> {
    state.engine().await?.delete_user(id).await?;
    Ok(Json(Message::new("user deleted")))
}
