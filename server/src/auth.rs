//! Request authentication
//!
//! Two capability checks guard the API:
//! - bearer JWT (HS256, `user_id` claim) for user-facing routes; yields the caller
//! - static API key in the `auth` header for machine-to-machine routes
//!
//! Both share one secret, `SMS_API_KEY`. Tokens are minted by an external
//! issuer holding the same secret.

use crate::error::ApiError;
use crate::routes::AppState;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use sms_gateway_shared::CallerId;
use thiserror::Error;
use tracing::{debug, warn};

/// Header carrying the static API key
pub const API_KEY_HEADER: &str = "auth";

/// Authentication failures, worded as the API reports them
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Token is missing")]
    MissingToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Token is invalid")]
    InvalidToken,

    #[error("INVALID AUTH")]
    InvalidApiKey,
}

/// JWT claims issued to users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub exp: u64,
}

/// Validates inbound credentials against the shared secret
pub struct Authenticator {
    decoding_key: DecodingKey,
    validation: Validation,
    api_key: String,
    #[cfg(test)]
    secret: String,
}

impl Authenticator {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            api_key: secret.to_string(),
            #[cfg(test)]
            secret: secret.to_string(),
        }
    }

    /// Validate an `Authorization` header value, yielding the caller
    ///
    /// The `Bearer ` prefix is optional; a bare token is accepted too.
    pub fn validate_bearer(&self, header: Option<&str>) -> Result<CallerId, AuthError> {
        let header = header
            .filter(|h| !h.is_empty())
            .ok_or(AuthError::MissingToken)?;
        let token = match header.strip_prefix("Bearer ") {
            Some(token) => token.trim(),
            None => header,
        };

        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => {
                debug!(user_id = data.claims.user_id, "Token validated");
                Ok(CallerId(data.claims.user_id))
            }
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => {
                    warn!("Token has expired");
                    Err(AuthError::ExpiredToken)
                }
                _ => {
                    warn!("Invalid token: {}", e);
                    Err(AuthError::InvalidToken)
                }
            },
        }
    }

    /// Check the static API key header
    pub fn check_api_key(&self, header: Option<&str>) -> Result<(), AuthError> {
        match header {
            Some(key) if !self.api_key.is_empty() && key == self.api_key => Ok(()),
            _ => Err(AuthError::InvalidApiKey),
        }
    }

    /// Mint a token with the shared secret
    #[cfg(test)]
    pub fn issue(&self, user_id: i64, ttl_secs: i64) -> String {
        use jsonwebtoken::{encode, EncodingKey, Header};

        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64;
        let claims = Claims {
            user_id,
            email: Some("user@example.com".into()),
            phone_number: None,
            exp: (now + ttl_secs).max(0) as u64,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .unwrap()
    }
}

/// Authenticated user, extracted from a bearer token
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub CallerId);

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        let caller = state.auth.validate_bearer(header)?;
        Ok(Caller(caller))
    }
}

/// Proof that the request carried the static API key
#[derive(Debug, Clone, Copy)]
pub struct ApiKey;

impl FromRequestParts<AppState> for ApiKey {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok());
        state.auth.check_api_key(header)?;
        Ok(ApiKey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_round_trip() {
        let auth = Authenticator::new("secret");
        let token = auth.issue(42, 3600);

        assert_eq!(auth.validate_bearer(Some(&format!("Bearer {}", token))), Ok(CallerId(42)));
        // Bare token without the prefix is accepted
        assert_eq!(auth.validate_bearer(Some(&token)), Ok(CallerId(42)));
    }

    #[test]
    fn test_missing_token() {
        let auth = Authenticator::new("secret");
        assert_eq!(auth.validate_bearer(None), Err(AuthError::MissingToken));
        assert_eq!(auth.validate_bearer(Some("")), Err(AuthError::MissingToken));
    }

    #[test]
    fn test_expired_token() {
        let auth = Authenticator::new("secret");
        // Well past the default 60s leeway
        let token = auth.issue(1, -3600);
        assert_eq!(
            auth.validate_bearer(Some(&format!("Bearer {}", token))),
            Err(AuthError::ExpiredToken)
        );
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let issuer = Authenticator::new("other-secret");
        let auth = Authenticator::new("secret");
        let token = issuer.issue(1, 3600);
        assert_eq!(
            auth.validate_bearer(Some(&format!("Bearer {}", token))),
            Err(AuthError::InvalidToken)
        );
        assert_eq!(auth.validate_bearer(Some("Bearer garbage")), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_api_key() {
        let auth = Authenticator::new("secret");
        assert_eq!(auth.check_api_key(Some("secret")), Ok(()));
        assert_eq!(auth.check_api_key(Some("nope")), Err(AuthError::InvalidApiKey));
        assert_eq!(auth.check_api_key(None), Err(AuthError::InvalidApiKey));
    }
}
