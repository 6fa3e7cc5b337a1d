//! User administration handlers (admin only)

use crate::auth::CurrentSession;
use crate::error::ErrorResponse;
use crate::{ApiError, AppState};
use axum::{extract::State, http::StatusCode, response::Json};
use axum_extra::extract::WithRejection;
use medstock_ledger::{NewUser, UserInfo};

/// List users, newest first
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    summary = "List users",
    responses(
        (status = 200, description = "All accounts", body = Vec<UserInfo>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Vec<UserInfo>>, ApiError> {
    Ok(Json(state.users.list_users(&session).await?))
}

/// Create a user account
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    summary = "Create user",
    request_body = NewUser,
    responses(
        (status = 201, description = "User created", body = UserInfo),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 409, description = "Name already taken", body = ErrorResponse),
        (status = 422, description = "Invalid name or password", body = ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
pub async fn create_user(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    WithRejection(Json(request), _): WithRejection<Json<NewUser>, ApiError>,
) -> Result<(StatusCode, Json<UserInfo>), ApiError> {
    let user = state.users.create_user(&session, request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}
