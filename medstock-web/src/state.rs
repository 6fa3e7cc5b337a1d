//! Application state management

use crate::WebResult;
use chrono::Duration;
use medstock_core::{system_clock, MedstockConfig, SharedClock};
use medstock_ledger::{
    Argon2Hasher, CatalogStore, CredentialStore, InventoryStore, PasswordHasher, SessionManager,
    SessionStore, SqliteStore, StockLedger, UserAdmin,
};
use std::sync::Arc;
use tracing::{info, warn};

/// State shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<MedstockConfig>,
    pub sessions: SessionManager,
    pub users: UserAdmin,
    pub ledger: StockLedger,
}

impl AppState {
    /// Open the configured database and create the bootstrap admin if needed
    pub async fn new(config: MedstockConfig) -> WebResult<Self> {
        let store = Arc::new(
            SqliteStore::connect(&config.database.url, config.database.max_connections).await?,
        );
        info!("Database ready: {}", config.database.url);

        let state = Self::with_store(
            config,
            store,
            Arc::new(Argon2Hasher::default()),
            system_clock(),
        )?;
        state.bootstrap_admin().await?;
        Ok(state)
    }

    /// Build state over an existing store
    pub fn with_store<S>(
        config: MedstockConfig,
        store: Arc<S>,
        hasher: Arc<dyn PasswordHasher>,
        clock: SharedClock,
    ) -> WebResult<Self>
    where
        S: CredentialStore + SessionStore + CatalogStore + InventoryStore + 'static,
    {
        let sessions =
            SessionManager::new(store.clone(), store.clone(), hasher.clone(), clock.clone())?
                .with_ttl(Duration::hours(config.session.ttl_hours));
        let users = UserAdmin::new(store.clone(), hasher, clock.clone());
        let ledger = StockLedger::new(store.clone(), store, clock);

        Ok(Self {
            config: Arc::new(config),
            sessions,
            users,
            ledger,
        })
    }

    /// Create the configured admin account when no account exists yet
    pub async fn bootstrap_admin(&self) -> WebResult<bool> {
        let Some((name, password)) = self.config.bootstrap.admin_credentials() else {
            return Ok(false);
        };
        Ok(self.users.ensure_bootstrap_admin(name, password).await?)
    }

    /// Periodic hygiene; failures are logged and retried on the next tick
    pub async fn cleanup_expired_sessions(&self) {
        if let Err(e) = self.sessions.sweep_expired().await {
            warn!(error = %e, "Session sweep failed");
        }
    }
}
