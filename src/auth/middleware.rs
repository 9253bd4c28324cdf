use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use tracing::debug;

use super::token::Claims;
use crate::error::AppError;
use crate::services::AuthServiceError;
use crate::AppState;

/// Admits requests with a valid session whose user still exists.
///
/// The role is refreshed from the stored user, so a demotion or deletion
/// takes effect before the token expires.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(mut claims) = state.sessions.authenticate(&jar) else {
        return AppError::Unauthorized.into_response();
    };

    match state.auth_service.current_user(&claims).await {
        Ok(user) => {
            claims.role = user.role;
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(AuthServiceError::UserNotFound) => {
            debug!(user_id = claims.user_id, "Session refers to a deleted user");
            AppError::Unauthorized.into_response()
        }
        Err(e) => AppError::from(e).into_response(),
    }
}

/// The verified identity of a request that passed `require_auth`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Claims);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(CurrentUser)
            .ok_or(AppError::Unauthorized)
    }
}
