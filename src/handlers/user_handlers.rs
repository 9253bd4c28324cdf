use crate::auth::middleware::CurrentUser;
use crate::error::Result;
use crate::models::user::PublicUser;
use crate::validation::{UpdateUserRequest, ValidationErrors};
use crate::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    limit: Option<i64>,
    offset: Option<i64>,
}

fn user_id(path: std::result::Result<Path<i64>, PathRejection>) -> Result<i64> {
    let Path(id) =
        path.map_err(|_| ValidationErrors::single("id", "User id must be an integer"))?;
    Ok(id)
}

pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Value>> {
    let limit = query.limit.map(|l| l.clamp(1, 500));
    let offset = query.offset.map(|o| o.max(0));

    let users: Vec<PublicUser> = state
        .user_service
        .list_users(&claims, limit, offset)
        .await?
        .into_iter()
        .map(PublicUser::from)
        .collect();

    Ok(Json(json!({
        "message": "Successfully retrieved users",
        "count": users.len(),
        "users": users,
    })))
}

pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    path: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>> {
    let id = user_id(path)?;
    let user = state.user_service.get_user(&claims, id).await?;

    Ok(Json(json!({
        "message": "User retrieved successfully",
        "user": PublicUser::from(user),
    })))
}

pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    path: std::result::Result<Path<i64>, PathRejection>,
    payload: std::result::Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let id = user_id(path)?;
    let Json(request) = payload
        .map_err(|rejection| ValidationErrors::single("body", rejection.body_text()))?;
    let changes = request.validate()?;

    let user = state.user_service.update_user(&claims, id, changes).await?;

    Ok(Json(json!({
        "message": "User updated successfully",
        "user": PublicUser::from(user),
    })))
}

/// Deleting your own account also ends the current session.
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    jar: CookieJar,
    path: std::result::Result<Path<i64>, PathRejection>,
) -> Result<(StatusCode, CookieJar, Json<Value>)> {
    let id = user_id(path)?;
    state.user_service.delete_user(&claims, id).await?;

    let jar = if claims.user_id == id {
        state.sessions.clear_session_cookie(jar)
    } else {
        jar
    };

    Ok((
        StatusCode::OK,
        jar,
        Json(json!({ "message": "User deleted successfully" })),
    ))
}
