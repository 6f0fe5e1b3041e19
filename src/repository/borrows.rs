//! Borrows repository for database operations
//!
//! Borrow and return each run inside a single transaction; the availability
//! counter is only ever moved through conditional updates whose affected-row
//! count is checked, so two concurrent borrows cannot over-draw a book under
//! read-committed isolation.

use chrono::{Duration, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::borrow::{Borrow, BorrowStatus},
};

#[derive(Clone)]
pub struct BorrowsRepository {
    pool: Pool<Postgres>,
}

impl BorrowsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get borrow by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Borrow> {
        sqlx::query_as::<_, Borrow>("SELECT * FROM borrows WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrow with id {} not found", id)))
    }

    /// List borrows ordered by id with skip/limit pagination.
    /// When `user_id` is given, only that user's borrows are returned.
    pub async fn list(&self, user_id: Option<i32>, skip: i64, limit: i64) -> AppResult<Vec<Borrow>> {
        let borrows = if let Some(user_id) = user_id {
            sqlx::query_as::<_, Borrow>(
                "SELECT * FROM borrows WHERE user_id = $1 ORDER BY id OFFSET $2 LIMIT $3",
            )
            .bind(user_id)
            .bind(skip)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, Borrow>(
                "SELECT * FROM borrows ORDER BY id OFFSET $1 LIMIT $2",
            )
            .bind(skip)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?
        };
        Ok(borrows)
    }

    /// Create a borrow and take one copy of the book, atomically.
    ///
    /// Fails `NotFound` if the book does not exist and `Conflict` if no copy
    /// is available. The decrement is conditional on `available_copies > 0`
    /// so a concurrent borrow of the last copy loses cleanly instead of
    /// driving the counter negative.
    pub async fn create(
        &self,
        user_id: i32,
        book_id: i32,
        days: i64,
        notes: Option<&str>,
    ) -> AppResult<Borrow> {
        let mut tx = self.pool.begin().await?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(book_id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Err(AppError::NotFound(format!("Book with id {} not found", book_id)));
        }

        let taken = sqlx::query(
            "UPDATE books SET available_copies = available_copies - 1, updated_at = NOW() \
             WHERE id = $1 AND available_copies > 0",
        )
        .bind(book_id)
        .execute(&mut *tx)
        .await?;
        if taken.rows_affected() == 0 {
            return Err(AppError::Conflict("No copies available".to_string()));
        }

        let now = Utc::now();
        let borrow = sqlx::query_as::<_, Borrow>(
            r#"
            INSERT INTO borrows (user_id, book_id, status, borrowed_at, due_date, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(BorrowStatus::Active)
        .bind(now)
        .bind(now + Duration::days(days))
        .bind(notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(borrow)
    }

    /// Transition a borrow to `returned` and give the copy back, atomically.
    ///
    /// Idempotent: if the borrow was already returned (by a concurrent call
    /// or an earlier one), the stored record is returned unchanged and the
    /// availability counter is not touched again.
    pub async fn mark_returned(&self, id: i32) -> AppResult<Borrow> {
        let mut tx = self.pool.begin().await?;

        let returned = sqlx::query_as::<_, Borrow>(
            r#"
            UPDATE borrows
            SET status = $2, returned_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND returned_at IS NULL AND status != $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(BorrowStatus::Returned)
        .fetch_optional(&mut *tx)
        .await?;

        let borrow = match returned {
            Some(borrow) => {
                sqlx::query(
                    "UPDATE books SET available_copies = available_copies + 1, updated_at = NOW() \
                     WHERE id = $1",
                )
                .bind(borrow.book_id)
                .execute(&mut *tx)
                .await?;
                tx.commit().await?;
                borrow
            }
            // Already returned: hand back the terminal record as-is
            None => {
                tx.commit().await?;
                self.get_by_id(id).await?
            }
        };

        Ok(borrow)
    }
}
