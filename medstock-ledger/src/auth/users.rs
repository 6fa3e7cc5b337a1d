//! User administration
//!
//! Account creation and listing are admin-only. The very first account can
//! be created without a session through [`UserAdmin::ensure_bootstrap_admin`].

use super::{require, NewUser, PasswordHasher, Role, SessionInfo, UserInfo, UserRecord};
use crate::store::{CredentialStore, StoreError};
use crate::{LedgerError, LedgerResult};
use medstock_core::SharedClock;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Minimum accepted password length, in characters
pub const MIN_PASSWORD_LEN: usize = 6;
const MAX_NAME_LEN: usize = 64;

/// Admin-facing front of the credential store
#[derive(Clone)]
pub struct UserAdmin {
    credentials: Arc<dyn CredentialStore>,
    hasher: Arc<dyn PasswordHasher>,
    clock: SharedClock,
}

impl UserAdmin {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        hasher: Arc<dyn PasswordHasher>,
        clock: SharedClock,
    ) -> Self {
        Self {
            credentials,
            hasher,
            clock,
        }
    }

    /// Create an account. Requires an admin session.
    pub async fn create_user(
        &self,
        session: &SessionInfo,
        request: NewUser,
    ) -> LedgerResult<UserInfo> {
        require(session, Role::Admin)?;

        let user = self.insert(request).await?;
        info!(admin = %session.name, user = %user.name, role = %user.role, "User created");
        Ok(user)
    }

    /// List accounts, newest first. Requires an admin session.
    pub async fn list_users(&self, session: &SessionInfo) -> LedgerResult<Vec<UserInfo>> {
        require(session, Role::Admin)?;

        let users = self.credentials.list_users().await?;
        debug!(count = users.len(), "Listed users");
        Ok(users.iter().map(UserRecord::to_user_info).collect())
    }

    /// Create an admin account if no account exists yet.
    ///
    /// Returns whether an account was created. Losing a creation race to
    /// another instance counts as "not created".
    pub async fn ensure_bootstrap_admin(&self, name: &str, password: &str) -> LedgerResult<bool> {
        if self.credentials.count_users().await? > 0 {
            debug!("Users exist, skipping bootstrap admin");
            return Ok(false);
        }

        let request = NewUser {
            name: name.to_string(),
            password: password.to_string(),
            role: Role::Admin,
        };

        match self.insert(request).await {
            Ok(user) => {
                info!(user = %user.name, "Bootstrap admin created");
                Ok(true)
            }
            Err(LedgerError::Conflict { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn insert(&self, request: NewUser) -> LedgerResult<UserInfo> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(LedgerError::validation("name", "Name is required"));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(LedgerError::validation(
                "name",
                format!("Name must be at most {} characters", MAX_NAME_LEN),
            ));
        }
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(LedgerError::validation(
                "password",
                format!(
                    "Password must be at least {} characters long",
                    MIN_PASSWORD_LEN
                ),
            ));
        }

        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            password_hash: self.hasher.hash(&request.password)?,
            role: request.role,
            created_at: self.clock.now(),
            last_login: None,
        };

        match self.credentials.insert_user(&record).await {
            Ok(()) => Ok(record.to_user_info()),
            Err(StoreError::Duplicate(_)) => Err(LedgerError::conflict(format!(
                "User '{}' already exists",
                record.name
            ))),
            Err(e) => Err(e.into()),
        }
    }
}
