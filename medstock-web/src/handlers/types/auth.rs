//! Authentication request/response types

use chrono::{DateTime, Utc};
use medstock_ledger::{Role, SessionInfo};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Login request
#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default, alias = "username")]
    #[schema(example = "admin")]
    pub name: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Identity of the logged-in user
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionUser {
    pub id: String,
    #[schema(example = "admin")]
    pub name: String,
    pub role: Role,
}

impl From<&SessionInfo> for SessionUser {
    fn from(session: &SessionInfo) -> Self {
        Self {
            id: session.user_id.clone(),
            name: session.name.clone(),
            role: session.role,
        }
    }
}

/// Login response. The token itself only travels in the cookie.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub user: SessionUser,
    pub expires_at: DateTime<Utc>,
}

/// Current-session response
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub user: SessionUser,
}
