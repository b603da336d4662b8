//! JWT Token Handler
//! Mission: Issue and validate signed, time-bounded session tokens

use crate::auth::models::Claims;
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;
use tracing::debug;

/// Only the HMAC family is ever accepted.
const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Signing(String),
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("malformed token: {0}")]
    Malformed(String),
}

/// Session token service
pub struct TokenService {
    secret: String,
    ttl: Duration,
}

impl TokenService {
    /// Create a token service with its signing secret and token lifetime
    pub fn new(secret: String, ttl: Duration) -> Self {
        Self { secret, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token whose subject is `account_id`
    pub fn issue(&self, account_id: &str) -> Result<String, TokenError> {
        if self.secret.is_empty() {
            return Err(TokenError::Signing("empty signing secret".to_string()));
        }

        let now = Utc::now();
        let expiration = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Signing("expiry out of range".to_string()))?;

        let claims = Claims {
            sub: account_id.to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expiration.timestamp(),
        };

        debug!(
            account_id,
            ttl_secs = self.ttl.num_seconds(),
            "Issuing session token"
        );

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Validate a token and return its subject.
    ///
    /// Valid means: HMAC signature under our secret, `nbf <= now < exp`.
    pub fn validate(&self, token: &str) -> Result<String, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = HMAC_ALGORITHMS.to_vec();
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "nbf", "sub"]);

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_)
            | ErrorKind::MissingRequiredClaim(_) => TokenError::Malformed(e.to_string()),
            _ => TokenError::Invalid(e.to_string()),
        })?;

        // The library accepts now == exp; the window is half-open.
        if Utc::now().timestamp() >= decoded.claims.exp {
            return Err(TokenError::Invalid("token expired".to_string()));
        }

        Ok(decoded.claims.sub)
    }
}
