//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{api_keys, auth, books, borrows, health, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "LMS API",
        version = "1.0.0",
        description = "Library Management System REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::refresh,
        auth::me,
        // Users
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        users::list_roles,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Borrows
        borrows::list_borrows,
        borrows::create_borrow,
        borrows::return_borrow,
        // API keys
        api_keys::create_api_key,
        api_keys::list_api_keys,
        api_keys::revoke_api_key,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::RefreshRequest,
            auth::TokenPairResponse,
            // Users
            crate::models::user::User,
            crate::models::user::Role,
            crate::models::user::CreateUser,
            crate::models::user::UpdateUser,
            crate::models::user::PageQuery,
            // Books
            crate::models::book::Book,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            // Borrows
            crate::models::borrow::Borrow,
            crate::models::borrow::BorrowStatus,
            crate::models::borrow::CreateBorrow,
            // API keys
            crate::models::api_key::ApiKey,
            crate::models::api_key::CreateApiKey,
            crate::models::api_key::ApiKeyCreated,
            // Permissions
            crate::models::permission::Permission,
            crate::models::permission::RoleName,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "users", description = "User and role management"),
        (name = "books", description = "Book catalog management"),
        (name = "borrows", description = "Borrow and return operations"),
        (name = "api-keys", description = "API key management")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
