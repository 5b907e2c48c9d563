//! Authentication and authorization
//!
//! Bearer tokens are HS256 JWTs whose `sub` is the caller's user id and
//! whose `roles` decide what the caller may touch.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use core_kernel::UserId;

use crate::error::ApiError;

pub mod roles {
    pub const ADMIN: &str = "admin";
    pub const CUSTOMER: &str = "customer";
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub roles: Vec<String>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == roles::ADMIN)
    }

    /// The caller's user id, parsed from `sub`
    pub fn user_id(&self) -> Result<UserId, ApiError> {
        self.sub.parse().map_err(|_| ApiError::Unauthorized)
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("admin role required".to_string()))
        }
    }

    /// Admins may act on anyone's records; everyone else only on their own
    pub fn require_self_or_admin(&self, owner: UserId) -> Result<(), ApiError> {
        if self.is_admin() || self.user_id()? == owner {
            Ok(())
        } else {
            Err(ApiError::Forbidden("not your record".to_string()))
        }
    }
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
}

/// Creates a new JWT token
pub fn create_token(
    user_id: UserId,
    roles: Vec<String>,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expiration_secs as i64);

    let claims = Claims {
        sub: user_id.as_uuid().to_string(),
        roles,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_token_round_trip() {
        let user_id = UserId::new();
        let token = create_token(user_id, vec![roles::CUSTOMER.into()], SECRET, 60).unwrap();
        let claims = validate_token(&token, SECRET).unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);
        assert!(!claims.is_admin());
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = create_token(UserId::new(), vec![], SECRET, 60).unwrap();
        assert!(matches!(validate_token(&token, "other"), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_self_or_admin() {
        let owner = UserId::new();
        let claims = Claims {
            sub: owner.as_uuid().to_string(),
            roles: vec![roles::CUSTOMER.into()],
            exp: 0,
            iat: 0,
        };
        assert!(claims.require_self_or_admin(owner).is_ok());
        assert!(claims.require_self_or_admin(UserId::new()).is_err());
        assert!(claims.require_admin().is_err());
    }
}
