use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("JWT_SECRET must be non-empty, tokens would be forgeable otherwise")]
    EmptySecret,
    #[error("invalid value for environment variable {0}")]
    InvalidVar(&'static str),
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt: JwtConfig,
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name))
}

impl AppConfig {
    /// Load configuration from the environment, failing fast on anything
    /// that would leave the service unable to issue or verify tokens.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = required("DATABASE_URL")?;

        let secret = required("JWT_SECRET")?;
        if secret.trim().is_empty() {
            return Err(ConfigError::EmptySecret);
        }

        // TTL must be strictly positive; a zero or negative value would
        // make every issued token dead on arrival at best.
        let ttl_hours = match std::env::var("JWT_TTL_HOURS") {
            Ok(v) => v
                .parse::<i64>()
                .ok()
                .filter(|hours| *hours > 0)
                .ok_or(ConfigError::InvalidVar("JWT_TTL_HOURS"))?,
            Err(_) => 24,
        };

        let host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = match std::env::var("APP_PORT") {
            Ok(v) => v
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidVar("APP_PORT"))?,
            Err(_) => 8080,
        };

        Ok(Self {
            host,
            port,
            database_url,
            jwt: JwtConfig { secret, ttl_hours },
        })
    }
}
