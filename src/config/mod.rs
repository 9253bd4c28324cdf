pub mod session;

use std::env;
use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use tracing::warn;

pub use session::SessionCookieConfig;

/// Minimum decoded length of `JWT_SECRET` accepted in production.
pub const MIN_PRODUCTION_SECRET_BYTES: usize = 32;

const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Longest accepted `JWT_EXPIRES_IN_HOURS` (one year).
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

/// Prefix marking a `JWT_SECRET` value as base64-encoded key material.
pub const BASE64_SECRET_PREFIX: &str = "base64:";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("Insecure production configuration: {0}")]
    Insecure(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "test" => Environment::Test,
            _ => Environment::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
        };
        f.write_str(name)
    }
}

/// Token signing settings.
#[derive(Clone)]
pub struct JwtConfig {
    pub secret: Vec<u8>,
    pub ttl: chrono::Duration,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Process-wide configuration, loaded once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub cookie: SessionCookieConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = current_environment();

        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_env("PORT", 3000u16)?;

        let ttl_hours = parse_env("JWT_EXPIRES_IN_HOURS", DEFAULT_TOKEN_TTL_HOURS)?;
        if ttl_hours <= 0 || ttl_hours > MAX_TOKEN_TTL_HOURS {
            return Err(ConfigError::Invalid {
                key: "JWT_EXPIRES_IN_HOURS",
                reason: format!("must be between 1 and {}", MAX_TOKEN_TTL_HOURS),
            });
        }
        let ttl = chrono::TimeDelta::try_hours(ttl_hours).ok_or(ConfigError::Invalid {
            key: "JWT_EXPIRES_IN_HOURS",
            reason: "out of range".to_string(),
        })?;

        let cookie_minutes = parse_env(
            "COOKIE_MAX_AGE_MINUTES",
            session::DEFAULT_COOKIE_MAX_AGE_MINUTES,
        )?;
        if cookie_minutes <= 0 {
            return Err(ConfigError::Invalid {
                key: "COOKIE_MAX_AGE_MINUTES",
                reason: "must be positive".to_string(),
            });
        }

        Ok(AppConfig {
            environment,
            database_url,
            host,
            port,
            jwt: JwtConfig {
                secret: load_jwt_secret(environment)?,
                ttl,
            },
            cookie: SessionCookieConfig::for_environment(environment, cookie_minutes),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment.is_production()
    }
}

/// Refuses to start a production deployment with a missing or weak signing secret.
pub fn validate_production_config() -> Result<(), ConfigError> {
    if !current_environment().is_production() {
        return Ok(());
    }

    let secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
    let secret_bytes = decode_secret_bytes(&secret)?;

    if secret_bytes.len() < MIN_PRODUCTION_SECRET_BYTES {
        return Err(ConfigError::Insecure(format!(
            "JWT_SECRET must be at least {} bytes",
            MIN_PRODUCTION_SECRET_BYTES
        )));
    }

    let lowered = secret.to_ascii_lowercase();
    if lowered.contains("example") || lowered.contains("changeme") || lowered.contains("default")
    {
        return Err(ConfigError::Insecure(
            "JWT_SECRET appears to be a placeholder value".to_string(),
        ));
    }

    Ok(())
}

fn current_environment() -> Environment {
    env::var("ENVIRONMENT")
        .map(|name| Environment::from_name(&name))
        .unwrap_or(Environment::Development)
}

fn parse_env<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: fmt::Display,
{
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => {
            value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                reason: e.to_string(),
            })
        }
        _ => Ok(default),
    }
}

fn load_jwt_secret(environment: Environment) -> Result<Vec<u8>, ConfigError> {
    match env::var("JWT_SECRET") {
        Ok(secret) if !secret.is_empty() => decode_secret_bytes(&secret),
        _ if environment.is_production() => Err(ConfigError::Missing("JWT_SECRET")),
        _ => {
            warn!("JWT_SECRET not set; generating ephemeral signing key (development only)");
            let mut bytes = vec![0u8; 64];
            OsRng.fill_bytes(&mut bytes);
            Ok(bytes)
        }
    }
}

/// Raw bytes of the secret, or the decoded key when it carries the `base64:` prefix.
fn decode_secret_bytes(secret: &str) -> Result<Vec<u8>, ConfigError> {
    match secret.strip_prefix(BASE64_SECRET_PREFIX) {
        Some(encoded) => STANDARD
            .decode(encoded.trim().as_bytes())
            .map_err(|e| ConfigError::Invalid {
                key: "JWT_SECRET",
                reason: format!("invalid base64: {}", e),
            }),
        None => Ok(secret.as_bytes().to_vec()),
    }
}
