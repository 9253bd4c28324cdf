//! Credential and session management: password hashing, session tokens,
//! the session cookie, and the HTTP handlers for the sign-up/in/out flow.

pub mod handlers;
pub mod manager;
pub mod middleware;
pub mod password;
pub mod token;

pub use manager::SessionManager;
pub use middleware::{require_auth, CurrentUser};
pub use token::{Claims, SessionTokens, TokenError};
