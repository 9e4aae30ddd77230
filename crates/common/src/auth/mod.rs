//! Authentication and authorization utilities
//!
//! Provides:
//! - JWT token generation and validation
//! - Caller identity extraction for handlers
//! - Role model (seller, buyer, admin)

use crate::errors::{AppError, Result};
use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Platform role carried in the token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Seller,
    Buyer,
    Admin,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Authenticated caller context available to handlers
#[derive(Debug, Clone)]
pub struct Identity {
    /// User ID
    pub id: Uuid,

    /// Platform role
    pub role: Role,

    /// Disabled accounts keep valid tokens until expiry but lose access
    pub is_active: bool,

    /// Request ID for tracing
    pub request_id: String,
}

impl Identity {
    /// Reject disabled accounts
    pub fn require_active(&self) -> Result<()> {
        if self.is_active {
            Ok(())
        } else {
            Err(AppError::AccountDisabled)
        }
    }

    /// Require the admin role
    pub fn require_admin(&self) -> Result<()> {
        self.require_active()?;
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(AppError::AdminRequired)
        }
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: String,

    /// Platform role
    pub role: Role,

    /// Account active flag at issue time
    #[serde(default = "default_active")]
    pub active: bool,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,
}

fn default_active() -> bool {
    true
}

/// JWT token manager
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager with the given secret
    pub fn new(secret: &str, expiration_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_secs: expiration_secs as i64,
        }
    }

    /// Generate a new JWT token
    pub fn generate_token(&self, user_id: Uuid, role: Role, active: bool) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.expiration_secs);

        let claims = JwtClaims {
            sub: user_id.to_string(),
            role,
            active,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| AppError::Internal {
            message: format!("Failed to generate token: {}", e),
        })
    }

    /// Validate and decode a JWT token
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims> {
        decode::<JwtClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::ExpiredToken,
                _ => AppError::Unauthorized {
                    message: "Invalid token".to_string(),
                },
            })
    }
}

/// Extract a bearer token from an Authorization header value
pub fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

fn request_id(parts: &Parts) -> String {
    parts
        .headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(String::from)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn identity_from_token(parts: &Parts, token: &str) -> Result<Identity> {
    let manager = parts
        .extensions
        .get::<Arc<JwtManager>>()
        .ok_or_else(|| AppError::Internal {
            message: "JwtManager extension not installed".to_string(),
        })?;

    let claims = manager.validate_token(token)?;
    let id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized {
        message: "Invalid subject in token".to_string(),
    })?;

    Ok(Identity {
        id,
        role: claims.role,
        is_active: claims.active,
        request_id: request_id(parts),
    })
}

/// Axum extractor for a required Identity
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized {
                message: "Missing Authorization header".to_string(),
            })?;

        let token = extract_bearer(auth_header).ok_or_else(|| AppError::Unauthorized {
            message: "Expected a bearer token".to_string(),
        })?;

        identity_from_token(parts, token)
    }
}

/// Optional caller identity for endpoints that serve anonymous traffic.
///
/// A missing Authorization header yields `None`; a present but invalid
/// token is still rejected.
#[derive(Debug, Clone)]
pub struct MaybeIdentity(pub Option<Identity>);

impl<S> FromRequestParts<S> for MaybeIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        let Some(auth_header) = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
        else {
            return Ok(MaybeIdentity(None));
        };

        let token = extract_bearer(auth_header).ok_or_else(|| AppError::Unauthorized {
            message: "Expected a bearer token".to_string(),
        })?;

        Ok(MaybeIdentity(Some(identity_from_token(parts, token)?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer("abc123"), None);
        assert_eq!(extract_bearer("Basic abc"), None);
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test_secret", 3600);
        let user_id = Uuid::new_v4();

        let token = manager.generate_token(user_id, Role::Seller, true).unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, Role::Seller);
        assert!(claims.active);
    }

    #[test]
    fn test_invalid_token_is_rejected() {
        let manager = JwtManager::new("test_secret", 3600);
        let other = JwtManager::new("other_secret", 3600);

        let token = other
            .generate_token(Uuid::new_v4(), Role::Buyer, true)
            .unwrap();
        assert!(manager.validate_token(&token).is_err());
    }

    #[test]
    fn test_admin_required() {
        let admin = Identity {
            id: Uuid::new_v4(),
            role: Role::Admin,
            is_active: true,
            request_id: "r".into(),
        };
        assert!(admin.require_admin().is_ok());

        let seller = Identity { role: Role::Seller, ..admin.clone() };
        assert!(seller.require_admin().is_err());

        let disabled = Identity { is_active: false, ..admin };
        assert!(matches!(
            disabled.require_admin(),
            Err(AppError::AccountDisabled)
        ));
    }
}
