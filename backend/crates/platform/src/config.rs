//! Deployment Environment Configuration
//!
//! Values are read from the process environment once at startup and then
//! passed around as immutable structs. Nothing below this crate reads
//! `std::env` on its own.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Configuration loading errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(String),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: String, value: String },
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
        }
    }

    /// Production-like environments get `Secure` cookies and short-lived
    /// access tokens.
    pub const fn is_production_like(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Read `APP_ENV`, defaulting to development when unset
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var("APP_ENV") {
            Ok(value) => value.parse(),
            Err(_) => {
                tracing::warn!("APP_ENV not set, defaulting to development");
                Ok(Environment::default())
            }
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" | "local" => Ok(Environment::Development),
            "test" | "testing" => Ok(Environment::Test),
            "prod" | "production" => Ok(Environment::Production),
            _ => Err(ConfigError::Invalid {
                name: "APP_ENV".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read a required variable
pub fn require_env(name: &str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name.to_string())),
    }
}

/// Read an optional variable and parse it, falling back to `default` when unset
pub fn env_or<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name: name.to_string(),
            value,
        }),
        Err(_) => Ok(default),
    }
}

/// Read an optional duration expressed in whole seconds
pub fn env_secs(name: &str, default: Duration) -> Result<Duration, ConfigError> {
    env_or(name, default.as_secs()).map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parse() {
        let cases = [
            ("prod", Environment::Production),
            ("Production", Environment::Production),
            ("dev", Environment::Development),
            ("test", Environment::Test),
        ];
        for (raw, expected) in cases {
            assert_eq!(raw.parse::<Environment>().unwrap(), expected);
        }
        assert!("staging-ish".parse::<Environment>().is_err());
    }

    #[test]
    fn test_production_like() {
        assert!(Environment::Production.is_production_like());
        assert!(!Environment::Development.is_production_like());
        assert!(!Environment::Test.is_production_like());
    }

    #[test]
    fn test_env_or_default_when_unset() {
        let value: u32 = env_or("PLATFORM_TEST_SURELY_UNSET_VAR", 10).unwrap();
        assert_eq!(value, 10);

        let ttl = env_secs("PLATFORM_TEST_SURELY_UNSET_TTL", Duration::from_secs(300)).unwrap();
        assert_eq!(ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_require_env_missing() {
        assert_eq!(
            require_env("PLATFORM_TEST_SURELY_UNSET_SECRET"),
            Err(ConfigError::Missing("PLATFORM_TEST_SURELY_UNSET_SECRET".to_string()))
        );
    }
}
