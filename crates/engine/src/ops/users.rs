use chrono::Utc;
use sea_orm::{
    ActiveValue, Condition, IntoActiveModel, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};
use tracing::info;

use crate::{
    EngineError, NewUser, ResultEngine, Role, User, UserUpdate,
    password::{hash_password, verify_password},
    users,
    util::{like_pattern, normalize_optional_text, normalize_required},
};

use super::{Engine, with_tx};

/// Account created on every connect when missing.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "password";

fn require_password(password: &str) -> ResultEngine<()> {
    if password.is_empty() {
        return Err(EngineError::InvalidAmount(
            "password must not be empty".to_string(),
        ));
    }
    Ok(())
}

impl Engine {
    pub async fn list_users(&self) -> ResultEngine<Vec<User>> {
        users::Entity::find()
            .order_by_asc(users::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    /// Users whose username or real name contains `keyword`.
    pub async fn search_users(&self, keyword: &str) -> ResultEngine<Vec<User>> {
        let pattern = like_pattern(keyword);
        users::Entity::find()
            .filter(
                Condition::any()
                    .add(users::Column::Username.like(pattern.clone()))
                    .add(users::Column::RealName.like(pattern)),
            )
            .order_by_asc(users::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    pub async fn create_user(&self, cmd: NewUser) -> ResultEngine<User> {
        let username = normalize_required(&cmd.username, "username")?;
        require_password(&cmd.password)?;
        let hash = hash_password(&cmd.password)?;
        let now = Utc::now();

        with_tx!(self, |db_tx| {
            let exists = users::Entity::find()
                .filter(users::Column::Username.eq(username.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(username));
            }

            let model = users::ActiveModel {
                id: ActiveValue::NotSet,
                username: ActiveValue::Set(username),
                password: ActiveValue::Set(hash),
                real_name: ActiveValue::Set(normalize_optional_text(cmd.real_name.as_deref())),
                phone: ActiveValue::Set(normalize_optional_text(cmd.phone.as_deref())),
                role: ActiveValue::Set(cmd.role.as_str().to_string()),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;
            User::try_from(model)
        })
    }

    /// Partial update; a blank password keeps the current one.
    pub async fn update_user(&self, user_id: i64, update: UserUpdate) -> ResultEngine<User> {
        let hash = match update.password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };

        with_tx!(self, |db_tx| {
            let model = users::Entity::find_by_id(user_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))?;
            let mut active = model.into_active_model();
            if let Some(hash) = hash {
                active.password = ActiveValue::Set(hash);
            }
            if let Some(real_name) = update.real_name.as_deref() {
                active.real_name = ActiveValue::Set(normalize_optional_text(Some(real_name)));
            }
            if let Some(phone) = update.phone.as_deref() {
                active.phone = ActiveValue::Set(normalize_optional_text(Some(phone)));
            }
            if let Some(role) = update.role {
                active.role = ActiveValue::Set(role.as_str().to_string());
            }
            active.updated_at = ActiveValue::Set(Utc::now());
            User::try_from(active.update(&db_tx).await?)
        })
    }

    pub async fn delete_user(&self, user_id: i64) -> ResultEngine<()> {
        let result = users::Entity::delete_by_id(user_id)
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::KeyNotFound("user not exists".to_string()));
        }
        Ok(())
    }

    /// Check a username/password pair.
    ///
    /// Unknown users and wrong passwords get the same error.
    pub async fn authenticate(&self, username: &str, password: &str) -> ResultEngine<User> {
        let invalid = || EngineError::Unauthorized("invalid username or password".to_string());
        let model = users::Entity::find()
            .filter(users::Column::Username.eq(username.trim()))
            .one(&self.database)
            .await?
            .ok_or_else(invalid)?;
        if !verify_password(password, &model.password) {
            return Err(invalid());
        }
        User::try_from(model)
    }

    /// Create the default `admin` account if it does not exist yet.
    ///
    /// Returns `true` when the account was created.
    pub async fn seed_admin(&self) -> ResultEngine<bool> {
        let exists = users::Entity::find()
            .filter(users::Column::Username.eq(DEFAULT_ADMIN_USERNAME))
            .one(&self.database)
            .await?
            .is_some();
        if exists {
            return Ok(false);
        }
        let cmd = NewUser::new(DEFAULT_ADMIN_USERNAME, DEFAULT_ADMIN_PASSWORD)
            .real_name("Administrator")
            .role(Role::Admin);
        match self.create_user(cmd).await {
            Ok(_) => {
                info!("seeded default admin account");
                Ok(true)
            }
            // lost a race with another seeder
            Err(EngineError::ExistingKey(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }
}
