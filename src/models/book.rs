//! Book catalog model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Book model from database.
/// Invariant: `0 <= available_copies <= total_copies` after every
/// borrow/return transition.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub publisher: Option<String>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub total_copies: i32,
    pub available_copies: i32,
    pub published_year: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_copies() -> i32 {
    1
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 20, message = "ISBN must be 1-20 characters"))]
    pub isbn: String,
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author must not be empty"))]
    pub author: String,
    pub publisher: Option<String>,
    pub genre: Option<String>,
    pub description: Option<String>,
    #[serde(default = "default_copies")]
    #[validate(range(min = 0, message = "total_copies must not be negative"))]
    pub total_copies: i32,
    #[serde(default = "default_copies")]
    #[validate(range(min = 0, message = "available_copies must not be negative"))]
    pub available_copies: i32,
    pub published_year: Option<i32>,
}

/// Update book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 20, message = "ISBN must be 1-20 characters"))]
    pub isbn: Option<String>,
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Author must not be empty"))]
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub genre: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0, message = "total_copies must not be negative"))]
    pub total_copies: Option<i32>,
    #[validate(range(min = 0, message = "available_copies must not be negative"))]
    pub available_copies: Option<i32>,
    pub published_year: Option<i32>,
}
