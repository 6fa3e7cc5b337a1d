//! Shared test harness: an in-memory app driven through `tower::ServiceExt`

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{TimeZone, Utc};
use medstock_core::{ManualClock, MedstockConfig};
use medstock_ledger::{Argon2Hasher, MemoryStore, NewUser, Role};
use medstock_web::{create_app, AppState};
use serde_json::Value;
use std::sync::{Arc, LazyLock};
use tower::ServiceExt;

pub const ADMIN: (&str, &str) = ("admin", "admin-pass");
pub const NURSE: (&str, &str) = ("nurse", "ward-7-pass");

// Subscriber is installed once per test binary
static TRACING: LazyLock<()> = LazyLock::new(|| {
    let level = if std::env::var("TEST_LOG").is_ok() {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_test_writer()
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
});

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub clock: ManualClock,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Admin bootstrapped from config, plus one ordinary user
    pub async fn spawn_with<F: FnOnce(&mut MedstockConfig)>(configure: F) -> Self {
        LazyLock::force(&TRACING);

        let mut config = MedstockConfig::default();
        config.bootstrap.admin_name = Some(ADMIN.0.to_string());
        config.bootstrap.admin_password = Some(ADMIN.1.to_string());
        configure(&mut config);

        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap());
        let state = AppState::with_store(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(Argon2Hasher::low_cost().unwrap()),
            Arc::new(clock.clone()),
        )
        .unwrap();
        assert!(state.bootstrap_admin().await.unwrap());

        let admin = state.sessions.authenticate(ADMIN.0, ADMIN.1).await.unwrap();
        state
            .users
            .create_user(
                &admin.info(),
                NewUser {
                    name: NURSE.0.to_string(),
                    password: NURSE.1.to_string(),
                    role: Role::User,
                },
            )
            .await
            .unwrap();
        state.sessions.revoke(&admin.token).await.unwrap();

        Self {
            router: create_app(state.clone()),
            state,
            clock,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Log in and return the `name=value` pair of the session cookie
    pub async fn login(&self, name: &str, password: &str) -> String {
        let response = self
            .send(json_request(
                Method::POST,
                "/api/auth/login",
                None,
                serde_json::json!({ "name": name, "password": password }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        session_cookie_pair(&response).expect("login sets the session cookie")
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        self.send(request(Method::GET, uri, cookie)).await
    }

    pub async fn post(&self, uri: &str, cookie: Option<&str>, body: Value) -> Response {
        self.send(json_request(Method::POST, uri, cookie, body)).await
    }
}

pub fn request(method: Method, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(method: Method, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Full `Set-Cookie` header for the session cookie, if present
pub fn set_cookie_header(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("session_id="))
        .map(str::to_string)
}

pub fn session_cookie_pair(response: &Response) -> Option<String> {
    set_cookie_header(response)
        .and_then(|header| header.split(';').next().map(str::to_string))
}

pub async fn extract_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
