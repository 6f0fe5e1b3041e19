//! User management service

use crate::{
    error::{AppError, AppResult},
    models::{
        permission::{role_permissions, RoleName},
        user::{CreateUser, Role, UpdateUser, User},
    },
    repository::Repository,
    services::auth::hash_password,
};

const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_PASSWORD: &str = "Admin@1234";

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Create a user with the default member role (self-service
    /// registration and admin creation share this path; roles are assigned
    /// afterwards via update).
    pub async fn create_user(&self, user: CreateUser) -> AppResult<User> {
        if self.repository.users.username_exists(&user.username, None).await? {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }
        if self.repository.users.email_exists(&user.email, None).await? {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        let role = self.default_member_role().await?;
        let password_hash = hash_password(&user.password)?;

        self.repository
            .users
            .create(&user.username, &user.email, &user.full_name, &password_hash, role.id)
            .await
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// List users with skip/limit pagination
    pub async fn list(&self, skip: i64, limit: i64) -> AppResult<Vec<User>> {
        self.repository.users.list(skip, limit).await
    }

    /// Update an existing user
    pub async fn update_user(&self, id: i32, user: UpdateUser) -> AppResult<User> {
        // Check if user exists
        self.repository.users.get_by_id(id).await?;

        if let Some(ref username) = user.username {
            if self.repository.users.username_exists(username, Some(id)).await? {
                return Err(AppError::Conflict("Username already exists".to_string()));
            }
        }
        if let Some(ref email) = user.email {
            if self.repository.users.email_exists(email, Some(id)).await? {
                return Err(AppError::Conflict("Email already exists".to_string()));
            }
        }
        if let Some(role_id) = user.role_id {
            self.repository.roles.get_by_id(role_id).await?;
        }

        // Hash password if provided
        let password_hash = if let Some(ref password) = user.password {
            Some(hash_password(password)?)
        } else {
            None
        };

        self.repository.users.update(id, &user, password_hash).await
    }

    /// Delete a user
    pub async fn delete_user(&self, id: i32) -> AppResult<()> {
        self.repository.users.delete(id).await
    }

    /// List all roles
    pub async fn list_roles(&self) -> AppResult<Vec<Role>> {
        self.repository.roles.list().await
    }

    /// The seeded member role every new account starts with
    async fn default_member_role(&self) -> AppResult<Role> {
        self.repository
            .roles
            .find_by_name(RoleName::Member.as_str())
            .await?
            .ok_or_else(|| {
                AppError::Configuration(
                    "Default member role not found. Have the built-in roles been seeded?".to_string(),
                )
            })
    }

    /// Seed the built-in roles and the default admin account.
    /// Idempotent: roles and users that already exist by name are skipped.
    pub async fn seed_defaults(&self) -> AppResult<()> {
        for role_name in RoleName::ALL {
            if self.repository.roles.find_by_name(role_name.as_str()).await?.is_some() {
                continue;
            }
            let permissions = serde_json::to_string(role_permissions(role_name))
                .map_err(|e| AppError::Internal(format!("Failed to serialize permissions: {}", e)))?;
            let description = match role_name {
                RoleName::Admin => "Administrator role",
                RoleName::Librarian => "Librarian role",
                RoleName::Member => "Member role",
            };
            self.repository
                .roles
                .create(role_name.as_str(), description, &permissions)
                .await?;
            tracing::info!("Seeded role '{}'", role_name);
        }

        if self
            .repository
            .users
            .get_by_username(DEFAULT_ADMIN_USERNAME)
            .await?
            .is_none()
        {
            let admin_role = self
                .repository
                .roles
                .find_by_name(RoleName::Admin.as_str())
                .await?
                .ok_or_else(|| {
                    AppError::Configuration("Admin role missing after seeding".to_string())
                })?;
            let password_hash = hash_password(DEFAULT_ADMIN_PASSWORD)?;
            self.repository
                .users
                .create(
                    DEFAULT_ADMIN_USERNAME,
                    "admin@library.com",
                    "System Administrator",
                    &password_hash,
                    admin_role.id,
                )
                .await?;
            tracing::info!("Seeded default admin user '{}'", DEFAULT_ADMIN_USERNAME);
        }

        Ok(())
    }
}
