//! Login, logout and current-session handlers

use super::types::{LoginRequest, LoginResponse, MeResponse, SessionUser, SuccessResponse};
use crate::auth::{removal_cookie, request_token, session_cookie};
use crate::error::ErrorResponse;
use crate::{ApiError, AppState};
use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Json, Response},
};
use axum_extra::extract::{cookie::CookieJar, WithRejection};
use tracing::{info, warn};

/// User login endpoint
///
/// Verifies name and password and sets the `session_id` cookie. Unknown
/// names and wrong passwords produce the same 401 response.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    summary = "Log in",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session created; cookie set", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(request), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let session = state
        .sessions
        .authenticate(&request.name, &request.password)
        .await?;

    let cookie = session_cookie(
        &session.token,
        session.expires_at,
        state.config.server.secure_cookies,
    );

    info!("User logged in: {}", session.name);
    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            user: SessionUser::from(&session.info()),
            expires_at: session.expires_at,
        }),
    ))
}

/// Current session endpoint
///
/// A missing, unknown or expired session answers 401 and clears the cookie.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    summary = "Current user",
    responses(
        (status = 200, description = "Session is valid", body = MeResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
pub async fn me(State(state): State<AppState>, jar: CookieJar, headers: HeaderMap) -> Response {
    let secure = state.config.server.secure_cookies;

    let Some(token) = request_token(&jar, &headers) else {
        return (jar.add(removal_cookie(secure)), ApiError::unauthenticated()).into_response();
    };

    match state.sessions.validate(&token).await {
        Ok(Some(session)) => Json(MeResponse {
            user: SessionUser::from(&session),
        })
        .into_response(),
        Ok(None) => {
            (jar.add(removal_cookie(secure)), ApiError::unauthenticated()).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Logout endpoint
///
/// Deletes the session if there is one and clears the cookie. Always 200.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    summary = "Log out",
    responses(
        (status = 200, description = "Logged out; cookie cleared", body = SuccessResponse)
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> (CookieJar, Json<SuccessResponse>) {
    if let Some(token) = request_token(&jar, &headers) {
        if let Err(e) = state.sessions.revoke(&token).await {
            warn!(error = %e, "Failed to revoke session on logout");
        }
    }

    (
        jar.add(removal_cookie(state.config.server.secure_cookies)),
        Json(SuccessResponse { success: true }),
    )
}
