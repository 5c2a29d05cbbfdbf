//! JWT verification for bearer tokens
//!
//! Tokens are issued elsewhere; this service only checks them.
//!
//! - Tokens are signed with HS256 (HMAC-SHA256)
//! - In production, JWT_SECRET should be a strong random value from environment

use jsonwebtoken::{decode, errors::ErrorKind, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use super::Caller;
use crate::types::TableStoreError;

/// Payload carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Principal id (24-char hex user id)
    pub user_id: String,
    /// Super users may administer permission sets
    #[serde(default)]
    pub is_super: bool,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

impl From<Claims> for Caller {
    fn from(claims: Claims) -> Self {
        Caller {
            id: claims.user_id,
            is_privileged: claims.is_super,
        }
    }
}

/// JWT validator
#[derive(Clone)]
pub struct JwtValidator {
    secret: String,
}

impl JwtValidator {
    /// Create a new JWT validator
    ///
    /// Returns an error if the secret is empty or too short
    pub fn new(secret: String) -> Result<Self, TableStoreError> {
        if secret.is_empty() {
            return Err(TableStoreError::Config(
                "JWT_SECRET is required in production mode".into(),
            ));
        }

        if secret.len() < 32 {
            return Err(TableStoreError::Config(
                "JWT_SECRET must be at least 32 characters".into(),
            ));
        }

        Ok(Self { secret })
    }

    /// Create a validator for dev mode (allows empty secret)
    pub fn new_dev() -> Self {
        Self {
            secret: "dev-mode-secret-not-for-production-use-123456".into(),
        }
    }

    /// Verify a token and return its claims
    pub fn verify_token(&self, token: &str) -> Result<Claims, TableStoreError> {
        let key = DecodingKey::from_secret(self.secret.as_bytes());
        let claims = decode::<Claims>(token, &key, &Validation::default())
            .map_err(|err| {
                let reason = match err.kind() {
                    ErrorKind::ExpiredSignature => "Token expired",
                    ErrorKind::InvalidSignature => "Invalid signature",
                    _ => "Invalid token",
                };
                TableStoreError::Unauthorized(reason.into())
            })?
            .claims;

        if claims.user_id.trim().is_empty() {
            return Err(TableStoreError::Unauthorized("Token has no user id".into()));
        }
        Ok(claims)
    }

    /// Resolve the caller from an `Authorization` header value
    pub fn authenticate(&self, auth_header: Option<&str>) -> Result<Caller, TableStoreError> {
        let token = extract_token_from_header(auth_header)
            .ok_or_else(|| TableStoreError::Unauthorized("Missing or malformed JWT".into()))?;
        self.verify_token(token).map(Caller::from)
    }
}

/// Extract token from Authorization header.
/// Supports "Bearer <token>" format and raw tokens.
pub fn extract_token_from_header(auth_header: Option<&str>) -> Option<&str> {
    let header = auth_header?;

    if let Some(token) = header.strip_prefix("Bearer ") {
        let token = token.trim();
        if !token.is_empty() {
            return Some(token);
        }
    }

    if !header.contains(' ') {
        let token = header.trim();
        if !token.is_empty() {
            return Some(token);
        }
    }

    None
}
