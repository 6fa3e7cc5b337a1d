//! Session cookies and the authenticated-session extractor

use crate::{ApiError, AppState};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use medstock_ledger::SessionInfo;
use time::OffsetDateTime;
use tracing::debug;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session_id";

/// Cookie carrying a freshly issued session token
pub fn session_cookie(token: &str, expires_at: DateTime<Utc>, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, token.to_string()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(secure)
        .build();

    if let Ok(expires) = OffsetDateTime::from_unix_timestamp(expires_at.timestamp()) {
        cookie.set_expires(expires);
    }
    cookie
}

/// Cookie instructing the browser to drop the session cookie
pub fn removal_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(secure)
        .max_age(time::Duration::ZERO)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build()
}

/// Session token from the cookie, or from an `Authorization: Bearer` header
pub fn request_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// A session validated for this request.
///
/// Extraction re-validates the token against the store every time, so
/// revocation, expiry and role changes take effect on the next request.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub SessionInfo);

impl<S> FromRequestParts<S> for CurrentSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);

        let Some(token) = request_token(&jar, &parts.headers) else {
            debug!("Request without session token");
            return Err(ApiError::unauthenticated());
        };

        match app_state.sessions.validate(&token).await? {
            Some(session) => Ok(CurrentSession(session)),
            None => Err(ApiError::unauthenticated()),
        }
    }
}
