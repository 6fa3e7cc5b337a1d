//! Session management
//!
//! Tokens are 256 random bits from the OS generator, encoded URL-safe base64.
//! The store only ever sees their SHA-256 digest. A session is valid while its
//! row exists and `now < expires_at`; there is no renewal.

use super::{PasswordHasher, Role};
use crate::store::{CredentialStore, SessionRecord, SessionStore};
use crate::{LedgerError, LedgerResult};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use medstock_core::SharedClock;
use rand::{rngs::OsRng, RngCore};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, info, warn};
#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Default absolute session lifetime
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

const TOKEN_BYTES: usize = 32;
/// Anything longer cannot be a token we issued
const MAX_TOKEN_LEN: usize = 128;
const DUMMY_PASSWORD: &str = "medstock-timing-equalizer";

/// Freshly issued session. The token is handed to the client once.
#[derive(Clone)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub name: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("name", &self.name)
            .field("role", &self.role)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl Session {
    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            user_id: self.user_id.clone(),
            name: self.name.clone(),
            role: self.role,
            expires_at: self.expires_at,
        }
    }
}

/// Identity behind a validated token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct SessionInfo {
    pub user_id: String,
    pub name: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

/// Issues, validates and revokes sessions
#[derive(Clone)]
pub struct SessionManager {
    credentials: Arc<dyn CredentialStore>,
    sessions: Arc<dyn SessionStore>,
    hasher: Arc<dyn PasswordHasher>,
    clock: SharedClock,
    ttl: Duration,
    dummy_hash: Arc<str>,
}

impl SessionManager {
    /// Create a session manager with the default 24 hour lifetime
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
        hasher: Arc<dyn PasswordHasher>,
        clock: SharedClock,
    ) -> LedgerResult<Self> {
        let dummy_hash = hasher.hash(DUMMY_PASSWORD)?;

        Ok(Self {
            credentials,
            sessions,
            hasher,
            clock,
            ttl: Duration::hours(DEFAULT_SESSION_TTL_HOURS),
            dummy_hash: Arc::from(dummy_hash),
        })
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Verify credentials and open a new session.
    ///
    /// Unknown names and wrong passwords fail identically. An unknown name
    /// still pays for one hash verification.
    pub async fn authenticate(&self, name: &str, password: &str) -> LedgerResult<Session> {
        if name.is_empty() || password.is_empty() {
            return Err(LedgerError::InvalidCredentials);
        }

        let user = self.credentials.find_user_by_name(name).await?;

        let user = match user {
            Some(user) if self.hasher.verify(password, &user.password_hash) => user,
            Some(_) => {
                debug!(user = %name, "Login rejected");
                return Err(LedgerError::InvalidCredentials);
            }
            None => {
                let _ = self.hasher.verify(password, &self.dummy_hash);
                debug!(user = %name, "Login rejected");
                return Err(LedgerError::InvalidCredentials);
            }
        };

        let now = self.clock.now();
        let token = generate_token();
        let record = SessionRecord {
            token_hash: token_digest(&token),
            user_id: user.id.clone(),
            created_at: now,
            expires_at: now + self.ttl,
        };

        self.sessions.create_session(&record).await?;

        info!(user = %user.name, role = %user.role, "Session created");

        Ok(Session {
            token,
            user_id: user.id,
            name: user.name,
            role: user.role,
            expires_at: record.expires_at,
        })
    }

    /// Resolve a token to its session. Fails closed: empty, unknown and
    /// expired tokens all yield `None`. Expired rows are removed on sight.
    pub async fn validate(&self, token: &str) -> LedgerResult<Option<SessionInfo>> {
        if token.is_empty() || token.len() > MAX_TOKEN_LEN {
            return Ok(None);
        }

        let digest = token_digest(token);
        let Some(stored) = self.sessions.find_session(&digest).await? else {
            return Ok(None);
        };

        if self.clock.now() >= stored.record.expires_at {
            debug!(user = %stored.owner.name, "Session expired");
            if let Err(e) = self.sessions.delete_session(&digest).await {
                warn!(error = %e, "Failed to delete expired session");
            }
            return Ok(None);
        }

        Ok(Some(SessionInfo {
            user_id: stored.owner.id,
            name: stored.owner.name,
            role: stored.owner.role,
            expires_at: stored.record.expires_at,
        }))
    }

    /// Delete the session if it exists. Revoking twice is not an error.
    pub async fn revoke(&self, token: &str) -> LedgerResult<()> {
        if token.is_empty() || token.len() > MAX_TOKEN_LEN {
            return Ok(());
        }

        if self.sessions.delete_session(&token_digest(token)).await? {
            info!("Session revoked");
        }
        Ok(())
    }

    /// Remove all expired sessions, returning how many were deleted
    pub async fn sweep_expired(&self) -> LedgerResult<u64> {
        let removed = self.sessions.delete_expired(self.clock.now()).await?;
        if removed > 0 {
            info!(removed, "Swept expired sessions");
        }
        Ok(removed)
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash a token for storage
fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
