//! API handlers for the LMS REST endpoints

pub mod api_keys;
pub mod auth;
pub mod books;
pub mod borrows;
pub mod health;
pub mod openapi;
pub mod users;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppError, models::user::User, AppState};

/// Extractor for the authenticated user, resolved from either an
/// `Authorization: Bearer` token or an `X-API-Key` header.
pub struct AuthenticatedUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let authorization = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        let api_key = parts
            .headers
            .get("x-api-key")
            .and_then(|value| value.to_str().ok());

        let user = state.services.auth.authenticate(authorization, api_key).await?;
        Ok(AuthenticatedUser(user))
    }
}

/// Paginated response wrapper
#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// List of items
    pub items: Vec<T>,
    /// Offset this page started at
    pub skip: i64,
    /// Maximum number of items per page
    pub limit: i64,
}
