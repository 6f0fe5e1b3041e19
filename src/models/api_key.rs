//! API key model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// API key model from database.
/// Only the SHA-256 digest of the full prefixed key is persisted; the raw
/// key is handed out once, at creation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ApiKey {
    pub id: i32,
    pub name: String,
    #[serde(skip_serializing)]
    pub key_hash: String,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create API key request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateApiKey {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Response for a freshly created API key, carrying the raw key.
/// This is the only time the raw value is ever shown.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiKeyCreated {
    pub api_key: ApiKey,
    pub key: String,
}
