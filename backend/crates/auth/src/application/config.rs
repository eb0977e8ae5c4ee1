//! Application Configuration
//!
//! Configuration for the Auth application layer. Built once at startup and
//! shared behind an `Arc`; use cases never read the environment themselves.

use std::time::Duration;

use platform::config::{ConfigError, Environment};
use platform::cookie::CookieConfig;
/// Re-export SameSite from platform
pub use platform::cookie::SameSite;
use platform::crypto::{random_bytes, to_base64url};

use crate::application::token::SigningSecret;

/// Refresh token lifetime (7 days)
pub const REFRESH_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 3600);

/// Access token lifetime in production-like environments (15 minutes)
pub const ACCESS_TOKEN_TTL_PRODUCTION: Duration = Duration::from_secs(15 * 60);

/// Access token lifetime in development and test (24 hours)
pub const ACCESS_TOKEN_TTL_DEVELOPMENT: Duration = Duration::from_secs(24 * 3600);

/// Default per-request deadline for a unit of work
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub const REFRESH_COOKIE_NAME: &str = "rt";

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub environment: Environment,
    /// Signs access tokens
    pub access_token_secret: SigningSecret,
    /// Signs refresh tokens (must differ from the access secret)
    pub refresh_token_secret: SigningSecret,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    /// Shared code required by admin sign-up
    pub admin_enrollment_code: String,
    /// Upper bound on a single unit of work
    pub request_timeout: Duration,
    pub refresh_cookie_name: String,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
}

impl AuthConfig {
    /// Config with environment-dependent defaults
    pub fn new(
        environment: Environment,
        access_token_secret: SigningSecret,
        refresh_token_secret: SigningSecret,
        admin_enrollment_code: impl Into<String>,
    ) -> Self {
        let access_token_ttl = if environment.is_production_like() {
            ACCESS_TOKEN_TTL_PRODUCTION
        } else {
            ACCESS_TOKEN_TTL_DEVELOPMENT
        };

        Self {
            environment,
            access_token_secret,
            refresh_token_secret,
            access_token_ttl,
            refresh_token_ttl: REFRESH_TOKEN_TTL,
            admin_enrollment_code: admin_enrollment_code.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            refresh_cookie_name: REFRESH_COOKIE_NAME.to_string(),
            cookie_secure: environment.is_production_like(),
            cookie_same_site: SameSite::Strict,
            password_pepper: None,
        }
    }

    /// Create config for development (random secrets, insecure cookie)
    pub fn development() -> Self {
        Self::new(
            Environment::Development,
            SigningSecret::new(to_base64url(&random_bytes(32))),
            SigningSecret::new(to_base64url(&random_bytes(32))),
            to_base64url(&random_bytes(16)),
        )
    }

    /// Reject configurations that must not start
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_token_secret.is_empty() {
            return Err(ConfigError::Missing("ACCESS_TOKEN_SECRET".to_string()));
        }
        if self.refresh_token_secret.is_empty() {
            return Err(ConfigError::Missing("REFRESH_TOKEN_SECRET".to_string()));
        }
        if self.access_token_secret == self.refresh_token_secret {
            return Err(ConfigError::Invalid {
                name: "REFRESH_TOKEN_SECRET".to_string(),
                value: "must differ from ACCESS_TOKEN_SECRET".to_string(),
            });
        }
        if self.admin_enrollment_code.trim().is_empty() {
            return Err(ConfigError::Missing("ADMIN_ENROLLMENT_CODE".to_string()));
        }
        if self.access_token_ttl.is_zero() {
            return Err(ConfigError::Invalid {
                name: "ACCESS_TOKEN_TTL_SECS".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    /// Refresh cookie attributes; Max-Age always equals the refresh token lifetime
    pub fn refresh_cookie(&self) -> CookieConfig {
        CookieConfig {
            name: self.refresh_cookie_name.clone(),
            secure: self.cookie_secure,
            http_only: true,
            same_site: self.cookie_same_site,
            path: "/".to_string(),
            max_age_secs: Some(self.refresh_token_ttl.as_secs() as i64),
        }
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(environment: Environment) -> AuthConfig {
        AuthConfig::new(
            environment,
            SigningSecret::new("access"),
            SigningSecret::new("refresh"),
            "enroll",
        )
    }

    #[test]
    fn test_environment_defaults() {
        let prod = config(Environment::Production);
        assert_eq!(prod.access_token_ttl, ACCESS_TOKEN_TTL_PRODUCTION);
        assert!(prod.cookie_secure);

        let dev = config(Environment::Development);
        assert_eq!(dev.access_token_ttl, ACCESS_TOKEN_TTL_DEVELOPMENT);
        assert!(!dev.cookie_secure);
    }

    #[test]
    fn test_cookie_max_age_tracks_refresh_ttl() {
        let mut cfg = config(Environment::Test);
        assert_eq!(cfg.refresh_cookie().max_age_secs, Some(604_800));

        cfg.refresh_token_ttl = Duration::from_secs(60);
        assert_eq!(cfg.refresh_cookie().max_age_secs, Some(60));
    }

    #[test]
    fn test_validate() {
        assert!(config(Environment::Test).validate().is_ok());
        assert!(AuthConfig::development().validate().is_ok());

        let same = AuthConfig::new(
            Environment::Test,
            SigningSecret::new("same"),
            SigningSecret::new("same"),
            "enroll",
        );
        assert!(same.validate().is_err());

        let mut no_code = config(Environment::Test);
        no_code.admin_enrollment_code = String::new();
        assert!(no_code.validate().is_err());

        let empty = AuthConfig::new(
            Environment::Test,
            SigningSecret::new(""),
            SigningSecret::new("refresh"),
            "enroll",
        );
        assert!(empty.validate().is_err());
    }
}
