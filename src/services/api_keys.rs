//! API key management service

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::api_key::{ApiKey, ApiKeyCreated, CreateApiKey},
    repository::Repository,
    services::auth::generate_api_key,
};

#[derive(Clone)]
pub struct ApiKeysService {
    repository: Repository,
    config: AuthConfig,
}

impl ApiKeysService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Issue a new API key for the acting user.
    /// The raw key appears in the response and nowhere else, ever.
    pub async fn create_key(&self, actor_id: i32, payload: CreateApiKey) -> AppResult<ApiKeyCreated> {
        let (raw_key, key_hash) = generate_api_key(&self.config.api_key_prefix);
        let api_key = self
            .repository
            .api_keys
            .create(actor_id, &payload.name, &key_hash, payload.expires_at)
            .await?;

        tracing::info!("API key {} issued for user {}", api_key.id, actor_id);
        Ok(ApiKeyCreated { api_key, key: raw_key })
    }

    /// List the acting user's keys
    pub async fn list_keys(&self, actor_id: i32) -> AppResult<Vec<ApiKey>> {
        self.repository.api_keys.list_for_user(actor_id).await
    }

    /// Deactivate one of the acting user's keys.
    /// Keys owned by other users answer `NotFound` so ids cannot be probed.
    pub async fn revoke_key(&self, actor_id: i32, key_id: i32) -> AppResult<ApiKey> {
        let key = self
            .repository
            .api_keys
            .find_by_id(key_id)
            .await?
            .filter(|k| k.user_id == actor_id)
            .ok_or_else(|| AppError::NotFound(format!("API key with id {} not found", key_id)))?;

        self.repository.api_keys.deactivate(key.id).await
    }
}
