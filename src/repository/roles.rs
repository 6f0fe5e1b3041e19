//! Roles repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::user::Role,
};

#[derive(Clone)]
pub struct RolesRepository {
    pool: Pool<Postgres>,
}

impl RolesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get role by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Role> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Role with id {} not found", id)))
    }

    /// Get role by ID if present
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<Role>> {
        let role = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }

    /// Get role by name if present
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        let role = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }

    /// List all roles ordered by id
    pub async fn list(&self) -> AppResult<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>("SELECT * FROM roles ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(roles)
    }

    /// Create a role with a serialized permission list
    pub async fn create(
        &self,
        name: &str,
        description: &str,
        permissions_json: &str,
    ) -> AppResult<Role> {
        let role = sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (name, description, permissions)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(permissions_json)
        .fetch_one(&self.pool)
        .await?;
        Ok(role)
    }
}
