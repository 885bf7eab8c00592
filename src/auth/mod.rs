//! Admin authentication
//!
//! A single shared password unlocks a short-lived HS256 bearer token; the
//! detailed statistics endpoints sit behind that token. Password comparison
//! is constant-time.

use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject; always "admin" for this single-operator service.
    pub sub: String,
    /// Expiration timestamp (Unix)
    pub exp: u64,
    /// Issued at timestamp (Unix)
    pub iat: u64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token generation failed: {0}")]
    TokenGeneration(String),
    #[error("invalid or expired token")]
    InvalidToken,
}

pub struct AuthService {
    jwt_secret: Vec<u8>,
    admin_password: String,
    token_ttl_secs: u64,
}

impl AuthService {
    pub fn new(jwt_secret: &str, admin_password: &str, token_ttl_secs: u64) -> Self {
        Self {
            jwt_secret: jwt_secret.as_bytes().to_vec(),
            admin_password: admin_password.to_string(),
            token_ttl_secs,
        }
    }

    pub fn token_ttl_secs(&self) -> u64 {
        self.token_ttl_secs
    }

    /// Constant-time comparison against the configured admin password.
    pub fn verify_password(&self, candidate: &str) -> bool {
        self.admin_password
            .as_bytes()
            .ct_eq(candidate.as_bytes())
            .into()
    }

    /// Issue a fresh admin token.
    pub fn issue_token(&self) -> Result<String, AuthError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))?
            .as_secs();

        let claims = Claims {
            sub: "admin".to_string(),
            exp: now + self.token_ttl_secs,
            iat: now,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(&self.jwt_secret),
        )
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.jwt_secret),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|_| AuthError::InvalidToken)
    }
}

#[derive(Serialize)]
struct AuthErrorBody {
    success: bool,
    error: String,
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(AuthErrorBody {
            success: false,
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// Axum middleware guarding the admin routes with a bearer token.
pub async fn admin_auth_middleware(
    auth_service: Arc<AuthService>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    let token = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    let Some(token) = token else {
        return unauthorized("Access denied - No token provided");
    };

    match auth_service.validate_token(token) {
        Ok(_) => next.run(request).await,
        Err(_) => unauthorized("Invalid or expired token"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new("test-secret", "hunter2", 3600)
    }

    #[test]
    fn test_password_verification() {
        let auth = service();
        assert!(auth.verify_password("hunter2"));
        assert!(!auth.verify_password("hunter3"));
        assert!(!auth.verify_password(""));
        assert!(!auth.verify_password("hunter22"));
    }

    #[test]
    fn test_token_round_trip() {
        let auth = service();
        let token = auth.issue_token().unwrap();
        let claims = auth.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "admin");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_tampered_token_rejected() {
        let auth = service();
        let mut token = auth.issue_token().unwrap();
        token.push('x');
        assert!(auth.validate_token(&token).is_err());
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let token = AuthService::new("other-secret", "hunter2", 3600)
            .issue_token()
            .unwrap();
        assert!(service().validate_token(&token).is_err());
    }
}
