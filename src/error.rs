use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::auth::password::HashingError;
use crate::auth::token::TokenError;
use crate::repositories::user_repository::RepositoryError;
use crate::services::{AuthServiceError, UserServiceError};
use crate::validation::ValidationErrors;

// Type alias for Result with our AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid email or password")]
    AuthenticationFailed,

    #[error("Authentication required")]
    Unauthorized,

    #[error("You do not have permission to perform this action")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] RepositoryError),

    #[error(transparent)]
    Hashing(#[from] HashingError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Internal detail of a 500 response, carried in response extensions.
///
/// Never serialized by `AppError` itself; `middleware::error_detail` decides
/// whether the deployment may show it.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::AuthenticationFailed | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Storage(_)
            | AppError::Hashing(_)
            | AppError::Token(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AuthServiceError> for AppError {
    fn from(err: AuthServiceError) -> Self {
        match err {
            AuthServiceError::EmailTaken => {
                AppError::Conflict("User with this email already exists".to_string())
            }
            AuthServiceError::InvalidCredentials => AppError::AuthenticationFailed,
            AuthServiceError::UserNotFound => AppError::Unauthorized,
            AuthServiceError::Hashing(e) => AppError::Hashing(e),
            AuthServiceError::Token(e) => AppError::Token(e),
            AuthServiceError::RepositoryError(e) => AppError::Storage(e),
        }
    }
}

impl From<UserServiceError> for AppError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::UserNotFound => AppError::NotFound("User not found".to_string()),
            UserServiceError::EmailTaken => {
                AppError::Conflict("User with this email already exists".to_string())
            }
            UserServiceError::Forbidden => AppError::Forbidden,
            UserServiceError::InvalidPassword => AppError::Validation(ValidationErrors::single(
                "password",
                "Password must be between 6 and 128 characters",
            )),
            UserServiceError::Hashing(e) => AppError::Hashing(e),
            UserServiceError::RepositoryError(e) => AppError::Storage(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            AppError::Validation(errors) => json!({
                "error": "Validation failed",
                "details": errors.errors(),
            }),
            AppError::Conflict(msg) | AppError::NotFound(msg) => json!({ "error": msg }),
            AppError::AuthenticationFailed | AppError::Unauthorized | AppError::Forbidden => {
                json!({ "error": self.to_string() })
            }
            AppError::Storage(_)
            | AppError::Hashing(_)
            | AppError::Token(_)
            | AppError::Internal(_) => {
                tracing::error!(error = ?self, "Request failed with internal error");
                let mut response = (status, Json(json!({ "error": "Internal server error" })))
                    .into_response();
                response
                    .extensions_mut()
                    .insert(ErrorDetail(self.to_string()));
                return response;
            }
        };

        (status, Json(body)).into_response()
    }
}
