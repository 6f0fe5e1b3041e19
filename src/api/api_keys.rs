//! API key management endpoints
//!
//! Keys are self-service: any authenticated user manages their own keys
//! and nobody else's.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::api_key::{ApiKey, ApiKeyCreated, CreateApiKey},
};

use super::AuthenticatedUser;

/// Issue a new API key. The raw key is shown only in this response.
#[utoipa::path(
    post,
    path = "/api-keys",
    tag = "api-keys",
    security(("bearer_auth" = []), ("api_key" = [])),
    request_body = CreateApiKey,
    responses(
        (status = 201, description = "API key created; raw key shown once", body = ApiKeyCreated),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_api_key(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<CreateApiKey>,
) -> AppResult<(StatusCode, Json<ApiKeyCreated>)> {
    payload.validate()?;

    let created = state.services.api_keys.create_key(actor.id, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// List the caller's API keys (hashes are never included)
#[utoipa::path(
    get,
    path = "/api-keys",
    tag = "api-keys",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status = 200, description = "List of the caller's API keys", body = Vec<ApiKey>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_api_keys(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> AppResult<Json<Vec<ApiKey>>> {
    let keys = state.services.api_keys.list_keys(actor.id).await?;
    Ok(Json(keys))
}

/// Revoke one of the caller's API keys
#[utoipa::path(
    delete,
    path = "/api-keys/{id}",
    tag = "api-keys",
    security(("bearer_auth" = []), ("api_key" = [])),
    params(
        ("id" = i32, Path, description = "API key ID")
    ),
    responses(
        (status = 200, description = "API key deactivated", body = ApiKey),
        (status = 404, description = "API key not found")
    )
)]
pub async fn revoke_api_key(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiKey>> {
    let key = state.services.api_keys.revoke_key(actor.id, id).await?;
    Ok(Json(key))
}
