//! User and role models, JWT claims

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::config::AuthConfig;
use crate::error::AppResult;

/// Role model from database.
/// `permissions` holds a JSON array of permission identifier strings; it is
/// only ever interpreted through [`Role::permission_set`].
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Role {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    #[serde(skip_serializing)]
    pub permissions: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    /// Parse the stored permission list. Malformed data degrades to the
    /// empty set rather than failing the request.
    pub fn permission_set(&self) -> HashSet<String> {
        serde_json::from_str(&self.permissions).unwrap_or_default()
    }

    /// Whether this role grants every required permission
    pub fn grants(&self, required: &[crate::models::Permission]) -> bool {
        let assigned = self.permission_set();
        required.iter().all(|p| assigned.contains(p.as_str()))
    }
}

/// User model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub username: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub is_active: bool,
    pub role_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration / user creation request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub full_name: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Update user request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    pub username: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub full_name: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
    pub is_active: Option<bool>,
    pub role_id: Option<i32>,
}

/// Pagination query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct PageQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    pub fn skip(&self) -> i64 {
        self.skip.unwrap_or(0).max(0)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(100).clamp(1, 500)
    }
}

/// Token kind carried in the `type` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims: subject is the user id as a string
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(rename = "type")]
    pub token_type: TokenType,
}

impl TokenClaims {
    /// Build short-lived access claims for a user
    pub fn access(user_id: i32, config: &AuthConfig) -> Self {
        Self::new(
            user_id,
            TokenType::Access,
            Duration::minutes(config.access_token_expire_minutes),
        )
    }

    /// Build long-lived refresh claims for a user
    pub fn refresh(user_id: i32, config: &AuthConfig) -> Self {
        Self::new(
            user_id,
            TokenType::Refresh,
            Duration::days(config.refresh_token_expire_days),
        )
    }

    fn new(user_id: i32, token_type: TokenType, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            token_type,
        }
    }

    /// Sign the claims into a token
    pub fn encode(&self, config: &AuthConfig) -> AppResult<String> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        let algorithm = config.jwt_algorithm()?;
        encode(
            &Header::new(algorithm),
            self,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .map_err(|e| crate::AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Verify signature and expiry, returning the claims.
    /// Signature mismatch, malformed structure and expiry are deliberately
    /// indistinguishable to callers.
    pub fn decode(token: &str, config: &AuthConfig) -> AppResult<Self> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let algorithm = config.jwt_algorithm()?;
        let data = decode::<Self>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::new(algorithm),
        )
        .map_err(|_| crate::AppError::Authentication("Invalid token".to_string()))?;
        Ok(data.claims)
    }

    /// Numeric user id from the subject claim
    pub fn user_id(&self) -> AppResult<i32> {
        self.sub
            .parse()
            .map_err(|_| crate::AppError::Authentication("Invalid token payload".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Permission;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "unit-test-secret".to_string(),
            ..AuthConfig::default()
        }
    }

    fn role_with(permissions: &str) -> Role {
        Role {
            id: 1,
            name: "librarian".to_string(),
            description: None,
            permissions: permissions.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn access_token_round_trips() {
        let config = test_config();
        let claims = TokenClaims::access(42, &config);
        let token = claims.encode(&config).unwrap();

        let decoded = TokenClaims::decode(&token, &config).unwrap();
        assert_eq!(decoded.sub, "42");
        assert_eq!(decoded.user_id().unwrap(), 42);
        assert_eq!(decoded.token_type, TokenType::Access);
        assert_eq!(decoded.exp, claims.exp);
        assert_eq!(decoded.iat, claims.iat);
    }

    #[test]
    fn refresh_token_keeps_its_type() {
        let config = test_config();
        let token = TokenClaims::refresh(7, &config).encode(&config).unwrap();
        let decoded = TokenClaims::decode(&token, &config).unwrap();
        assert_eq!(decoded.token_type, TokenType::Refresh);
        assert!(decoded.exp > decoded.iat);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let config = test_config();
        let token = TokenClaims::access(1, &config).encode(&config).unwrap();

        // Flip one character of the signature
        let mut tampered = token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        assert!(TokenClaims::decode(&tampered, &config).is_err());
        assert!(TokenClaims::decode("not-a-token", &config).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = test_config();
        let claims = TokenClaims {
            sub: "1".to_string(),
            exp: (Utc::now() - Duration::hours(2)).timestamp(),
            iat: (Utc::now() - Duration::hours(3)).timestamp(),
            token_type: TokenType::Access,
        };
        let token = claims.encode(&config).unwrap();
        assert!(TokenClaims::decode(&token, &config).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let config = test_config();
        let other = AuthConfig {
            jwt_secret: "another-secret".to_string(),
            ..AuthConfig::default()
        };
        let token = TokenClaims::access(1, &config).encode(&config).unwrap();
        assert!(TokenClaims::decode(&token, &other).is_err());
    }

    #[test]
    fn non_numeric_subject_is_rejected() {
        let claims = TokenClaims {
            sub: "alice".to_string(),
            exp: 0,
            iat: 0,
            token_type: TokenType::Access,
        };
        assert!(claims.user_id().is_err());
    }

    #[test]
    fn permission_set_parses_stored_json() {
        let role = role_with(r#"["book:read", "borrow:create"]"#);
        let set = role.permission_set();
        assert!(set.contains("book:read"));
        assert!(set.contains("borrow:create"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn malformed_permissions_degrade_to_empty_set() {
        for raw in ["not json", "{\"a\": 1}", "", "[1, 2]"] {
            let role = role_with(raw);
            assert!(role.permission_set().is_empty(), "expected empty set for {:?}", raw);
            assert!(!role.grants(&[Permission::BookRead]));
        }
    }

    #[test]
    fn grants_requires_every_permission() {
        let role = role_with(r#"["book:read", "borrow:read"]"#);
        assert!(role.grants(&[Permission::BookRead]));
        assert!(role.grants(&[Permission::BookRead, Permission::BorrowRead]));
        assert!(!role.grants(&[Permission::BookRead, Permission::BookDelete]));
        assert!(role.grants(&[]));
    }
}
