//! Borrow transaction service
//!
//! Lifecycle per borrow: `active -(return)-> returned`, nothing else.
//! Members act only on their own borrows; librarians and admins may act on
//! anyone's.

use crate::{
    error::{AppError, AppResult},
    models::{
        borrow::{Borrow, CreateBorrow},
        permission::RoleName,
        user::User,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct BorrowsService {
    repository: Repository,
}

impl BorrowsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Borrow a book.
    ///
    /// Members always borrow for themselves; any caller-supplied `user_id`
    /// is ignored for them. Other roles may borrow on another user's behalf
    /// and default to themselves when no owner is given.
    pub async fn borrow_book(&self, actor: &User, payload: CreateBorrow) -> AppResult<Borrow> {
        let owner_id = if self.is_member(actor).await? {
            actor.id
        } else {
            payload.user_id.unwrap_or(actor.id)
        };

        if owner_id != actor.id {
            // Borrowing on behalf of someone else: the owner must exist
            self.repository.users.get_by_id(owner_id).await?;
        }

        let borrow = self
            .repository
            .borrows
            .create(owner_id, payload.book_id, payload.days, payload.notes.as_deref())
            .await?;

        tracing::info!(
            "Borrow {} created: user {} took book {}",
            borrow.id,
            borrow.user_id,
            borrow.book_id
        );
        Ok(borrow)
    }

    /// Return a borrow. Idempotent: an already-returned borrow comes back
    /// unchanged instead of erroring or double-crediting the book.
    pub async fn return_borrow(&self, actor: &User, borrow_id: i32) -> AppResult<Borrow> {
        let borrow = self.repository.borrows.get_by_id(borrow_id).await?;

        if self.is_member(actor).await? && borrow.user_id != actor.id {
            return Err(AppError::Authorization("Forbidden".to_string()));
        }

        if borrow.is_returned() {
            return Ok(borrow);
        }

        let returned = self.repository.borrows.mark_returned(borrow_id).await?;
        tracing::info!(
            "Borrow {} returned: book {} back in circulation",
            returned.id,
            returned.book_id
        );
        Ok(returned)
    }

    /// List borrows: members see only their own, every other role sees all
    pub async fn list_borrows(&self, actor: &User, skip: i64, limit: i64) -> AppResult<Vec<Borrow>> {
        let scope = if self.is_member(actor).await? {
            Some(actor.id)
        } else {
            None
        };
        self.repository.borrows.list(scope, skip, limit).await
    }

    async fn is_member(&self, actor: &User) -> AppResult<bool> {
        let role = self.repository.roles.find_by_id(actor.role_id).await?;
        Ok(role.map(|r| r.name == RoleName::Member.as_str()).unwrap_or(false))
    }
}
