//! Token Service
//!
//! HS256-signed JWTs carrying `{ sub, iat, exp }`. The subject is the
//! principal's numeric ID. Access and refresh tokens share the format and
//! differ only in lifetime and signing secret.

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use kernel::id::PrincipalId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::config::AuthConfig;
use crate::error::{AuthError, AuthResult};

/// The single message returned for any token the service rejects
pub const INVALID_TOKEN_MESSAGE: &str = "invalid or expired token";

/// HMAC signing secret
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret(String);

impl SigningSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SigningSecret").field(&"[REDACTED]").finish()
    }
}

/// JWT claims embedded in every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - principal ID as a decimal string.
    pub sub: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
}

impl Claims {
    /// Subject as a principal ID
    pub fn principal_id(&self) -> Result<PrincipalId, TokenError> {
        self.sub.parse().map_err(|_| TokenError::Invalid)
    }
}

/// Verification failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Bad signature, wrong algorithm, malformed, or missing claims
    #[error("token is invalid")]
    Invalid,

    #[error("token has expired")]
    Expired,
}

impl From<TokenError> for AuthError {
    fn from(_: TokenError) -> Self {
        AuthError::Unauthorized(INVALID_TOKEN_MESSAGE.to_string())
    }
}

/// Access + refresh token pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues and verifies access and refresh tokens
#[derive(Debug, Clone)]
pub struct TokenService {
    access_secret: SigningSecret,
    refresh_secret: SigningSecret,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            access_secret: config.access_token_secret.clone(),
            refresh_secret: config.refresh_token_secret.clone(),
            access_ttl: config.access_token_ttl,
            refresh_ttl: config.refresh_token_ttl,
        }
    }

    /// Sign a token for `subject` valid for `lifetime` from now.
    pub fn issue(
        subject: PrincipalId,
        lifetime: Duration,
        secret: &SigningSecret,
    ) -> AuthResult<String> {
        Self::issue_at(subject, lifetime, secret, Utc::now().timestamp())
    }

    /// Sign a token as if issued at `now` (Unix seconds).
    pub fn issue_at(
        subject: PrincipalId,
        lifetime: Duration,
        secret: &SigningSecret,
        now: i64,
    ) -> AuthResult<String> {
        let claims = Claims {
            sub: subject.to_string(),
            iat: now,
            exp: now + lifetime.as_secs() as i64,
        };

        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| AuthError::Internal(format!("JWT encode: {e}")))
    }

    /// Check signature and expiry against the current time.
    pub fn verify(token: &str, secret: &SigningSecret) -> Result<Claims, TokenError> {
        Self::verify_at(token, secret, Utc::now().timestamp())
    }

    /// Check signature and expiry against `now` (Unix seconds).
    ///
    /// A token is valid while `now < exp`.
    pub fn verify_at(token: &str, secret: &SigningSecret, now: i64) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["sub", "exp"]);

        let claims = jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|_| TokenError::Invalid)?;

        claims.principal_id()?;

        if now >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    pub fn issue_access(&self, subject: PrincipalId) -> AuthResult<String> {
        Self::issue(subject, self.access_ttl, &self.access_secret)
    }

    pub fn issue_refresh(&self, subject: PrincipalId) -> AuthResult<String> {
        Self::issue(subject, self.refresh_ttl, &self.refresh_secret)
    }

    pub fn issue_pair(&self, subject: PrincipalId) -> AuthResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue_access(subject)?,
            refresh_token: self.issue_refresh(subject)?,
        })
    }

    pub fn verify_access(&self, token: &str) -> Result<Claims, TokenError> {
        Self::verify(token, &self.access_secret)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        Self::verify(token, &self.refresh_secret)
    }
}
