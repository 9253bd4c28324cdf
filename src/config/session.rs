use axum_extra::extract::cookie::SameSite;
use time::Duration;

use super::Environment;

pub const SESSION_COOKIE_NAME: &str = "token";
pub const DEFAULT_COOKIE_MAX_AGE_MINUTES: i64 = 15;

/// Attributes of the cookie that carries the session token.
#[derive(Debug, Clone)]
pub struct SessionCookieConfig {
    pub name: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    pub max_age: Duration,
}

impl SessionCookieConfig {
    pub fn for_environment(environment: Environment, max_age_minutes: i64) -> Self {
        SessionCookieConfig {
            name: SESSION_COOKIE_NAME.to_string(),
            secure: environment.is_production(),
            http_only: true,
            same_site: SameSite::Strict,
            max_age: Duration::minutes(max_age_minutes),
        }
    }
}

impl Default for SessionCookieConfig {
    fn default() -> Self {
        Self::for_environment(Environment::Development, DEFAULT_COOKIE_MAX_AGE_MINUTES)
    }
}
