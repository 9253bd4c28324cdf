pub mod auth_service;
pub mod user_service;

pub use auth_service::{AuthService, AuthServiceError, SignedInUser};
pub use user_service::{UserService, UserServiceError};
