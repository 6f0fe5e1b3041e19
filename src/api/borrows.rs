//! Borrow and return endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        borrow::{Borrow, CreateBorrow},
        permission::Permission,
        user::PageQuery,
    },
};

use super::{AuthenticatedUser, PaginatedResponse};

/// List borrows with pagination.
/// Members only ever see their own; librarians and admins see everything.
#[utoipa::path(
    get,
    path = "/borrows",
    tag = "borrows",
    security(("bearer_auth" = []), ("api_key" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "List of borrows", body = PaginatedResponse<Borrow>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_borrows(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<Borrow>>> {
    state.services.auth.authorize(&actor, &[Permission::BorrowRead]).await?;

    let (skip, limit) = (query.skip(), query.limit());
    let borrows = state.services.borrows.list_borrows(&actor, skip, limit).await?;

    Ok(Json(PaginatedResponse { items: borrows, skip, limit }))
}

/// Borrow a book
#[utoipa::path(
    post,
    path = "/borrows",
    tag = "borrows",
    security(("bearer_auth" = []), ("api_key" = [])),
    request_body = CreateBorrow,
    responses(
        (status = 201, description = "Borrow created", body = Borrow),
        (status = 404, description = "Book not found"),
        (status = 409, description = "No copies available")
    )
)]
pub async fn create_borrow(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<CreateBorrow>,
) -> AppResult<(StatusCode, Json<Borrow>)> {
    state.services.auth.authorize(&actor, &[Permission::BorrowCreate]).await?;
    payload.validate()?;

    let borrow = state.services.borrows.borrow_book(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(borrow)))
}

/// Return a borrowed book.
/// Returning an already-returned borrow yields the stored record unchanged.
#[utoipa::path(
    post,
    path = "/borrows/{id}/return",
    tag = "borrows",
    security(("bearer_auth" = []), ("api_key" = [])),
    params(
        ("id" = i32, Path, description = "Borrow ID")
    ),
    responses(
        (status = 200, description = "Borrow returned", body = Borrow),
        (status = 403, description = "Not the borrow's owner"),
        (status = 404, description = "Borrow not found")
    )
)]
pub async fn return_borrow(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Borrow>> {
    state.services.auth.authorize(&actor, &[Permission::BorrowReturn]).await?;

    let borrow = state.services.borrows.return_borrow(&actor, id).await?;
    Ok(Json(borrow))
}
