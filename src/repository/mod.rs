//! Repository layer for database operations

pub mod api_keys;
pub mod books;
pub mod borrows;
pub mod roles;
pub mod users;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub users: users::UsersRepository,
    pub roles: roles::RolesRepository,
    pub books: books::BooksRepository,
    pub borrows: borrows::BorrowsRepository,
    pub api_keys: api_keys::ApiKeysRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            users: users::UsersRepository::new(pool.clone()),
            roles: roles::RolesRepository::new(pool.clone()),
            books: books::BooksRepository::new(pool.clone()),
            borrows: borrows::BorrowsRepository::new(pool.clone()),
            api_keys: api_keys::ApiKeysRepository::new(pool.clone()),
            pool,
        }
    }
}
