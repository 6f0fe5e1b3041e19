//! User management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        permission::Permission,
        user::{CreateUser, PageQuery, Role, UpdateUser, User},
    },
};

use super::{AuthenticatedUser, PaginatedResponse};

/// List users with pagination
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = []), ("api_key" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "List of users", body = PaginatedResponse<User>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Insufficient permissions")
    )
)]
pub async fn list_users(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<User>>> {
    state.services.auth.authorize(&actor, &[Permission::MemberRead]).await?;

    let (skip, limit) = (query.skip(), query.limit());
    let users = state.services.users.list(skip, limit).await?;

    Ok(Json(PaginatedResponse { items: users, skip, limit }))
}

/// Get user details by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = []), ("api_key" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User details", body = User),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<User>> {
    state.services.auth.authorize(&actor, &[Permission::MemberRead]).await?;

    let user = state.services.users.get_by_id(id).await?;
    Ok(Json(user))
}

/// Create a new user (starts with the member role)
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = []), ("api_key" = [])),
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username or email already exists")
    )
)]
pub async fn create_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<CreateUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    state.services.auth.authorize(&actor, &[Permission::MemberCreate]).await?;
    payload.validate()?;

    let created = state.services.users.create_user(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update an existing user.
/// Changing `role_id` additionally requires the role management permission.
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = []), ("api_key" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 403, description = "Insufficient permissions"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUser>,
) -> AppResult<Json<User>> {
    state.services.auth.authorize(&actor, &[Permission::MemberUpdate]).await?;
    if payload.role_id.is_some() {
        state.services.auth.authorize(&actor, &[Permission::RoleManage]).await?;
    }
    payload.validate()?;

    let updated = state.services.users.update_user(id, payload).await?;
    Ok(Json(updated))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = []), ("api_key" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Insufficient permissions"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.auth.authorize(&actor, &[Permission::MemberDelete]).await?;

    state.services.users.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List roles
#[utoipa::path(
    get,
    path = "/roles",
    tag = "users",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status = 200, description = "List of roles", body = Vec<Role>),
        (status = 403, description = "Insufficient permissions")
    )
)]
pub async fn list_roles(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> AppResult<Json<Vec<Role>>> {
    state.services.auth.authorize(&actor, &[Permission::RoleManage]).await?;

    let roles = state.services.users.list_roles().await?;
    Ok(Json(roles))
}
