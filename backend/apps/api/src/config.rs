//! Server Configuration
//!
//! Everything the process needs is read from the environment here, once,
//! before the server starts.

use std::net::SocketAddr;
use std::time::Duration;

use auth::{AuthConfig, SigningSecret};
use base64::Engine;
use base64::engine::general_purpose;
use platform::config::{ConfigError, Environment, env_or, env_secs, require_env};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:31113";
const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:40922,http://127.0.0.1:40922";

/// Connection pool settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub frontend_origins: Vec<String>,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let environment = Environment::from_env()?;

        let bind_addr = env_or("BIND_ADDR", DEFAULT_BIND_ADDR.to_string())?;
        let bind_addr = bind_addr.parse().map_err(|_| ConfigError::Invalid {
            name: "BIND_ADDR".to_string(),
            value: bind_addr.clone(),
        })?;

        let frontend_origins = env_or("FRONTEND_ORIGINS", DEFAULT_FRONTEND_ORIGINS.to_string())?
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let database = DatabaseConfig {
            url: require_env("DATABASE_URL")?,
            max_connections: env_or("DB_MAX_CONNECTIONS", 10)?,
            min_connections: env_or("DB_MIN_IDLE", 1)?,
            idle_timeout: env_secs("DB_IDLE_TIMEOUT_SECS", Duration::from_secs(300))?,
            acquire_timeout: env_secs("DB_ACQUIRE_TIMEOUT_SECS", Duration::from_secs(5))?,
        };

        let mut auth = AuthConfig::new(
            environment,
            SigningSecret::new(require_env("ACCESS_TOKEN_SECRET")?),
            SigningSecret::new(require_env("REFRESH_TOKEN_SECRET")?),
            require_env("ADMIN_ENROLLMENT_CODE")?,
        );
        auth.access_token_ttl = env_secs("ACCESS_TOKEN_TTL_SECS", auth.access_token_ttl)?;
        auth.request_timeout = env_secs("REQUEST_TIMEOUT_SECS", auth.request_timeout)?;
        auth.password_pepper = match std::env::var("PASSWORD_PEPPER") {
            Ok(pepper) if !pepper.trim().is_empty() => Some(
                general_purpose::STANDARD
                    .decode(pepper.trim())
                    .map_err(|_| ConfigError::Invalid {
                        name: "PASSWORD_PEPPER".to_string(),
                        value: "<not base64>".to_string(),
                    })?,
            ),
            _ => None,
        };
        auth.validate()?;

        Ok(Self {
            bind_addr,
            frontend_origins,
            database,
            auth,
        })
    }
}
