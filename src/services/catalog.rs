//! Book catalog management service

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, CreateBook, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List books with skip/limit pagination
    pub async fn list_books(&self, skip: i64, limit: i64) -> AppResult<Vec<Book>> {
        self.repository.books.list(skip, limit).await
    }

    /// Get book by ID
    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Create a new book
    pub async fn create_book(&self, book: CreateBook) -> AppResult<Book> {
        if self.repository.books.isbn_exists(&book.isbn, None).await? {
            return Err(AppError::Conflict("ISBN already exists".to_string()));
        }
        if book.available_copies > book.total_copies {
            return Err(AppError::Validation(
                "available_copies cannot exceed total_copies".to_string(),
            ));
        }
        self.repository.books.create(&book).await
    }

    /// Update an existing book
    pub async fn update_book(&self, id: i32, book: UpdateBook) -> AppResult<Book> {
        let current = self.repository.books.get_by_id(id).await?;

        if let Some(ref isbn) = book.isbn {
            if self.repository.books.isbn_exists(isbn, Some(id)).await? {
                return Err(AppError::Conflict("ISBN already exists".to_string()));
            }
        }

        let total = book.total_copies.unwrap_or(current.total_copies);
        let available = book.available_copies.unwrap_or(current.available_copies);
        if available > total {
            return Err(AppError::Validation(
                "available_copies cannot exceed total_copies".to_string(),
            ));
        }

        self.repository.books.update(id, &book).await
    }

    /// Delete a book
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await
    }
}
