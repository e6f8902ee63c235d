//! User repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use annograph_core::result::AppResult;
use annograph_core::types::UserId;
use annograph_entity::user::{User, UserProfile};

use super::{db_err, map_unique};
use crate::store::UserStore;

/// Repository for user rows.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create(&self, user: &User) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO users (id, user_account, user_name, user_avatar, user_profile, \
             user_role, is_deleted, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(user.id)
        .bind(&user.user_account)
        .bind(&user.user_name)
        .bind(&user.user_avatar)
        .bind(&user.user_profile)
        .bind(user.user_role)
        .bind(user.is_deleted)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_unique(
                e,
                "users_user_account_key",
                || format!("Account '{}' already exists", user.user_account),
                "Failed to create user",
            )
        })?;
        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND NOT is_deleted")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find user"))
    }

    async fn find_by_account(&self, account: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE user_account = $1 AND NOT is_deleted",
        )
        .bind(account)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to find user by account"))
    }

    async fn profiles(&self, ids: &[UserId]) -> AppResult<Vec<UserProfile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = ids.iter().map(|id| id.into_uuid()).collect();
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE id = ANY($1) AND NOT is_deleted",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to load user profiles"))?;
        Ok(users.iter().map(User::profile).collect())
    }
}
