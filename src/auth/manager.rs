//! The single gate between raw credentials or tokens and a verified identity.
//!
//! `SessionManager` holds only immutable material (signing keys and cookie
//! attributes) and is shared across requests behind an `Arc`.

use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::debug;

use super::password::{self, HashingError};
use super::token::{Claims, SessionTokens, TokenError};
use crate::config::{AppConfig, SessionCookieConfig};
use crate::models::user::User;

#[derive(Debug, Clone)]
pub struct SessionManager {
    tokens: SessionTokens,
    cookie: SessionCookieConfig,
}

impl SessionManager {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            tokens: SessionTokens::new(&config.jwt),
            cookie: config.cookie.clone(),
        }
    }

    /// Hashes on the blocking pool so request workers are not stalled by Argon2.
    pub async fn hash_password(&self, password: String) -> Result<String, HashingError> {
        tokio::task::spawn_blocking(move || password::hash_password(&password))
            .await
            .map_err(|e| HashingError(format!("hashing task failed: {}", e)))?
    }

    pub async fn verify_password(
        &self,
        password: String,
        password_hash: String,
    ) -> Result<bool, HashingError> {
        tokio::task::spawn_blocking(move || password::verify_password(&password, &password_hash))
            .await
            .map_err(|e| HashingError(format!("verification task failed: {}", e)))?
    }

    pub fn issue_token(&self, user: &User) -> Result<String, TokenError> {
        self.tokens.issue(user)
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.tokens.verify(token)
    }

    pub fn set_session_cookie(&self, jar: CookieJar, token: String) -> CookieJar {
        let cookie = Cookie::build((self.cookie.name.clone(), token))
            .path("/")
            .http_only(self.cookie.http_only)
            .secure(self.cookie.secure)
            .same_site(self.cookie.same_site)
            .max_age(self.cookie.max_age);

        jar.add(cookie)
    }

    /// Always emits a removal cookie, whether or not the request carried one.
    pub fn clear_session_cookie(&self, jar: CookieJar) -> CookieJar {
        let mut cookie = Cookie::build((self.cookie.name.clone(), ""))
            .path("/")
            .http_only(self.cookie.http_only)
            .secure(self.cookie.secure)
            .same_site(self.cookie.same_site)
            .build();
        cookie.make_removal();

        jar.add(cookie)
    }

    /// Resolves the request's session. Missing, expired and invalid tokens all mean anonymous.
    pub fn authenticate(&self, jar: &CookieJar) -> Option<Claims> {
        let token = jar.get(&self.cookie.name)?.value();
        if token.is_empty() {
            return None;
        }

        match self.verify_token(token) {
            Ok(claims) => Some(claims),
            Err(TokenError::Expired) => {
                debug!("Session token expired; treating request as anonymous");
                None
            }
            Err(e) => {
                debug!("Rejected session token: {}", e);
                None
            }
        }
    }
}
