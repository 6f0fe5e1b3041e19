//! Authentication and authorization service
//!
//! Credentials come in two schemes: a bearer JWT issued at login, or a
//! long-lived API key carried in `X-API-Key`. Either resolves to a `User`;
//! permission checks then run against the user's role.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        permission::Permission,
        user::{TokenClaims, TokenType, User},
    },
    repository::Repository,
};

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a password against its stored hash
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Stable SHA-256 digest of the full API key, prefix included.
/// Applied identically at issuance and at lookup.
pub fn hash_api_key(raw_key: &str) -> String {
    hex::encode(Sha256::digest(raw_key.as_bytes()))
}

/// Produce a fresh API key: 32 random bytes hex-encoded behind the
/// configured prefix. Returns `(raw_key, key_hash)`; only the hash is
/// ever persisted.
pub fn generate_api_key(prefix: &str) -> (String, String) {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    let raw_key = format!("{}{}", prefix, hex::encode(bytes));
    let key_hash = hash_api_key(&raw_key);
    (raw_key, key_hash)
}

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Authenticate by username and password, returning an
    /// (access, refresh) token pair. Unknown users, inactive accounts and
    /// wrong passwords are indistinguishable to the caller.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<(String, String)> {
        let user = self
            .repository
            .users
            .get_by_username(username)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::Authentication("Incorrect username or password".to_string()))?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Authentication("Incorrect username or password".to_string()));
        }

        self.issue_pair(user.id)
    }

    /// Exchange a refresh token for a new token pair
    pub fn refresh(&self, refresh_token: &str) -> AppResult<(String, String)> {
        let claims = TokenClaims::decode(refresh_token, &self.config)?;
        if claims.token_type != TokenType::Refresh {
            return Err(AppError::Authentication("Invalid token type".to_string()));
        }
        self.issue_pair(claims.user_id()?)
    }

    fn issue_pair(&self, user_id: i32) -> AppResult<(String, String)> {
        let access = TokenClaims::access(user_id, &self.config).encode(&self.config)?;
        let refresh = TokenClaims::refresh(user_id, &self.config).encode(&self.config)?;
        Ok((access, refresh))
    }

    /// Resolve an inbound request's identity.
    ///
    /// A bearer token takes priority over an API key; refresh tokens never
    /// grant resource access. An API key without the configured prefix is
    /// rejected before any hashing or lookup.
    pub async fn authenticate(
        &self,
        authorization: Option<&str>,
        api_key: Option<&str>,
    ) -> AppResult<User> {
        if let Some(header) = authorization {
            if header.len() > 7 && header[..7].eq_ignore_ascii_case("bearer ") {
                let claims = TokenClaims::decode(&header[7..], &self.config)?;
                if claims.token_type != TokenType::Access {
                    return Err(AppError::Authentication("Invalid token type".to_string()));
                }
                return self.active_user(claims.user_id()?).await;
            }
        }

        if let Some(raw_key) = api_key {
            if !raw_key.starts_with(&self.config.api_key_prefix) {
                return Err(AppError::Authentication("Invalid API key prefix".to_string()));
            }
            let key = self
                .repository
                .api_keys
                .find_active_by_hash(&hash_api_key(raw_key))
                .await?
                .ok_or_else(|| {
                    AppError::Authentication("Invalid or inactive API key".to_string())
                })?;
            return self.active_user(key.user_id).await;
        }

        Err(AppError::Authentication("Not authenticated".to_string()))
    }

    async fn active_user(&self, user_id: i32) -> AppResult<User> {
        self.repository
            .users
            .find_by_id(user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::Authentication("User not found or inactive".to_string()))
    }

    /// Check that the user's role grants every required permission.
    /// The response never names the missing permission.
    pub async fn authorize(&self, user: &User, required: &[Permission]) -> AppResult<()> {
        let role = self
            .repository
            .roles
            .find_by_id(user.role_id)
            .await?
            .ok_or_else(|| AppError::Authorization("User has no role".to_string()))?;

        if !role.grants(required) {
            return Err(AppError::Authorization("Insufficient permissions".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies_and_rejects() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash).unwrap());
        assert!(!verify_password("incorrect horse", &hash).unwrap());
    }

    #[test]
    fn password_hashes_are_salted() {
        let a = hash_password("same password").unwrap();
        let b = hash_password("same password").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("same password", &a).unwrap());
        assert!(verify_password("same password", &b).unwrap());
    }

    #[test]
    fn api_key_hash_is_deterministic() {
        let (raw, hash) = generate_api_key("lms_");
        assert_eq!(hash_api_key(&raw), hash);
        assert_eq!(hash_api_key(&raw), hash_api_key(&raw));
    }

    #[test]
    fn api_keys_are_unique_and_prefixed() {
        let (raw_a, hash_a) = generate_api_key("lms_");
        let (raw_b, hash_b) = generate_api_key("lms_");
        assert!(raw_a.starts_with("lms_"));
        assert!(raw_b.starts_with("lms_"));
        assert_ne!(raw_a, raw_b);
        assert_ne!(hash_a, hash_b);
    }

    #[test]
    fn differing_raw_keys_hash_differently() {
        assert_ne!(hash_api_key("lms_aaaa"), hash_api_key("lms_aaab"));
    }
}
