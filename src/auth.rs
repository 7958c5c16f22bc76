use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;
use crate::AppState;

/// JWT claims for an OTP-authenticated session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Authenticated email address
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies session tokens.
#[derive(Clone)]
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration: Duration,
}

impl AuthService {
    pub fn new(secret: &str, expiration_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration: Duration::seconds(expiration_secs as i64),
        }
    }

    pub fn issue_token(&self, email: &str) -> Result<String, ServiceError> {
        let now = Utc::now();
        let claims = Claims {
            sub: email.to_string(),
            iat: now.timestamp(),
            exp: (now + self.expiration).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ServiceError::InternalError(format!("failed to sign token: {}", e)))
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, ServiceError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| ServiceError::AuthError("Invalid or expired token".to_string()))
    }
}

/// Extractor that requires a valid `Authorization: Bearer` token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub email: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ServiceError::AuthError("Missing authorization header".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ServiceError::AuthError("Expected bearer token".to_string()))?;

        let claims = state.auth.verify_token(token)?;
        Ok(AuthenticatedUser { email: claims.sub })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies() {
        let auth = AuthService::new("test_secret_key_for_testing_purposes_only", 3600);
        let token = auth.issue_token("sam@example.com").unwrap();
        let claims = auth.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "sam@example.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn garbage_token_is_rejected() {
        let auth = AuthService::new("test_secret_key_for_testing_purposes_only", 3600);
        assert!(auth.verify_token("not.a.token").is_err());
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let auth = AuthService::new("test_secret_key_for_testing_purposes_only", 3600);
        let other = AuthService::new("a_completely_different_secret_value_here", 3600);
        let token = other.issue_token("sam@example.com").unwrap();
        assert!(auth.verify_token(&token).is_err());
    }
}
