//! API keys repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::api_key::ApiKey,
};

#[derive(Clone)]
pub struct ApiKeysRepository {
    pool: Pool<Postgres>,
}

impl ApiKeysRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get API key by ID if present
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<ApiKey>> {
        let key = sqlx::query_as::<_, ApiKey>("SELECT * FROM api_keys WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(key)
    }

    /// Look up an active key by its stored hash
    pub async fn find_active_by_hash(&self, key_hash: &str) -> AppResult<Option<ApiKey>> {
        let key = sqlx::query_as::<_, ApiKey>(
            "SELECT * FROM api_keys WHERE key_hash = $1 AND is_active = TRUE",
        )
        .bind(key_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(key)
    }

    /// List a user's keys ordered by id
    pub async fn list_for_user(&self, user_id: i32) -> AppResult<Vec<ApiKey>> {
        let keys = sqlx::query_as::<_, ApiKey>(
            "SELECT * FROM api_keys WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(keys)
    }

    /// Create a new API key row (hash only, never the raw key)
    pub async fn create(
        &self,
        user_id: i32,
        name: &str,
        key_hash: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> AppResult<ApiKey> {
        let key = sqlx::query_as::<_, ApiKey>(
            r#"
            INSERT INTO api_keys (user_id, name, key_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(key_hash)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(key)
    }

    /// Deactivate a key
    pub async fn deactivate(&self, id: i32) -> AppResult<ApiKey> {
        sqlx::query_as::<_, ApiKey>(
            "UPDATE api_keys SET is_active = FALSE, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("API key with id {} not found", id)))
    }
}
