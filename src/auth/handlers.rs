use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::CookieJar;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use super::middleware::CurrentUser;
use crate::error::{AppError, Result};
use crate::models::user::PublicUser;
use crate::validation::{SignInRequest, SignUpRequest, ValidationErrors};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub user: PublicUser,
}

fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        AppError::from(ValidationErrors::single("body", rejection.body_text()))
    })
}

pub async fn sign_up(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: std::result::Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>)> {
    let input = json_body(payload)?.validate()?;

    let signed_in = state.auth_service.sign_up(input).await?;
    let jar = state.sessions.set_session_cookie(jar, signed_in.token);

    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            message: "User registered",
            user: signed_in.user.into(),
        }),
    ))
}

pub async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: std::result::Result<Json<SignInRequest>, JsonRejection>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>)> {
    let input = json_body(payload)?.validate()?;

    let signed_in = state.auth_service.sign_in(input).await?;
    let jar = state.sessions.set_session_cookie(jar, signed_in.token);

    Ok((
        StatusCode::OK,
        jar,
        Json(AuthResponse {
            message: "User signed in successfully",
            user: signed_in.user.into(),
        }),
    ))
}

/// Clears the session cookie. Succeeds with or without a prior session.
pub async fn sign_out(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (StatusCode, CookieJar, Json<Value>) {
    if let Some(claims) = state.sessions.authenticate(&jar) {
        info!(user_id = claims.user_id, "User signed out");
    }

    let jar = state.sessions.clear_session_cookie(jar);
    (
        StatusCode::OK,
        jar,
        Json(json!({ "message": "User signed out successfully" })),
    )
}

pub async fn me(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<Json<PublicUser>> {
    let user = state.auth_service.current_user(&claims).await?;
    Ok(Json(user.into()))
}
