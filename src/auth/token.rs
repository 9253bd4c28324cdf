//! Signed session tokens (HS256 JWT).

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;
use crate::models::user::{User, UserRole};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,
    #[error("Token is invalid")]
    Invalid,
    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// Wire payload. Only ever produced by `SessionTokens` or read after signature checks.
#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    sub: String,
    role: UserRole,
    iat: i64,
    exp: i64,
}

/// Verified identity carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub user_id: i64,
    pub role: UserRole,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Whether this identity may act on the user with `user_id`.
    pub fn can_access_user(&self, user_id: i64) -> bool {
        self.is_admin() || self.user_id == user_id
    }
}

/// Issues and verifies session tokens with the server secret.
#[derive(Clone)]
pub struct SessionTokens {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: chrono::Duration,
}

impl std::fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokens")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl SessionTokens {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against an explicit clock in `verify_at`.
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(&config.secret),
            decoding_key: DecodingKey::from_secret(&config.secret),
            validation,
            ttl: config.ttl,
        }
    }

    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        self.issue_at(user, Utc::now())
    }

    pub fn issue_at(&self, user: &User, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = TokenClaims {
            sub: user.id.to_string(),
            role: user.role,
            iat: now.timestamp(),
            exp: now
                .checked_add_signed(self.ttl)
                .ok_or_else(|| TokenError::Signing("token lifetime out of range".to_string()))?
                .timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Checks the signature first, then expiry against `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| TokenError::Invalid)?;
        let claims = data.claims;

        let user_id = claims.sub.parse::<i64>().map_err(|_| TokenError::Invalid)?;
        let issued_at = DateTime::from_timestamp(claims.iat, 0).ok_or(TokenError::Invalid)?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(TokenError::Invalid)?;

        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(Claims {
            user_id,
            role: claims.role,
            issued_at,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn tokens(secret: &[u8]) -> SessionTokens {
        SessionTokens::new(&JwtConfig {
            secret: secret.to_vec(),
            ttl: Duration::days(1),
        })
    }

    fn user(role: UserRole) -> User {
        User {
            id: 42,
            email: "buyer@example.com".to_string(),
            password_hash: "hash".to_string(),
            role,
            created_at: "2025-01-01T00:00:00Z".to_string(),
            updated_at: "2025-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_issued_token_carries_identity() {
        let tokens = tokens(b"0123456789abcdef0123456789abcdef");
        let now = Utc::now();
        let token = tokens.issue_at(&user(UserRole::Admin), now).unwrap();

        let claims = tokens.verify_at(&token, now).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.role, UserRole::Admin);
        assert_eq!(claims.issued_at.timestamp(), now.timestamp());
        assert_eq!(claims.expires_at.timestamp(), (now + Duration::days(1)).timestamp());
    }

    #[test]
    fn test_valid_until_one_day() {
        let tokens = tokens(b"0123456789abcdef0123456789abcdef");
        let issued = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let token = tokens.issue_at(&user(UserRole::User), issued).unwrap();

        assert!(tokens.verify_at(&token, issued).is_ok());
        assert!(tokens
            .verify_at(&token, issued + Duration::hours(12))
            .is_ok());
        assert!(tokens
            .verify_at(&token, issued + Duration::days(1) - Duration::seconds(1))
            .is_ok());
        assert_eq!(
            tokens.verify_at(&token, issued + Duration::days(1)),
            Err(TokenError::Expired)
        );
        assert_eq!(
            tokens.verify_at(&token, issued + Duration::days(30)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_lifetime_past_calendar_range_is_an_error() {
        let tokens = SessionTokens::new(&JwtConfig {
            secret: b"0123456789abcdef0123456789abcdef".to_vec(),
            ttl: Duration::days(100_000_000),
        });

        assert!(matches!(
            tokens.issue(&user(UserRole::User)),
            Err(TokenError::Signing(_))
        ));
    }

    #[test]
    fn test_other_secret_is_invalid() {
        let issuer = tokens(b"first-secret-first-secret-first-s");
        let verifier = tokens(b"other-secret-other-secret-other-s");
        let token = issuer.issue(&user(UserRole::User)).unwrap();

        assert_eq!(verifier.verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_bad_signature_wins_over_expiry() {
        let issuer = tokens(b"first-secret-first-secret-first-s");
        let verifier = tokens(b"other-secret-other-secret-other-s");
        let issued = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let token = issuer.issue_at(&user(UserRole::User), issued).unwrap();

        assert_eq!(
            verifier.verify_at(&token, issued + Duration::days(2)),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn test_garbage_is_invalid() {
        let tokens = tokens(b"0123456789abcdef0123456789abcdef");
        assert_eq!(tokens.verify("not.a.jwt"), Err(TokenError::Invalid));
        assert_eq!(tokens.verify(""), Err(TokenError::Invalid));
    }

    #[test]
    fn test_tampered_payload_is_invalid() {
        let tokens = tokens(b"0123456789abcdef0123456789abcdef");
        let token = tokens.issue(&user(UserRole::User)).unwrap();
        let admin_token = tokens.issue(&user(UserRole::Admin)).unwrap();

        // Splice the admin payload onto the user signature.
        let parts: Vec<&str> = token.split('.').collect();
        let admin_parts: Vec<&str> = admin_token.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], admin_parts[1], parts[2]);

        assert_eq!(tokens.verify(&forged), Err(TokenError::Invalid));
    }

    #[test]
    fn test_access_rules() {
        let now = Utc::now();
        let claims = Claims {
            user_id: 5,
            role: UserRole::User,
            issued_at: now,
            expires_at: now,
        };
        assert!(claims.can_access_user(5));
        assert!(!claims.can_access_user(6));

        let admin = Claims {
            role: UserRole::Admin,
            ..claims
        };
        assert!(admin.can_access_user(6));
    }
}
