//! MedStock Web Server
//!
//! Binds the listener, runs the expired-session sweeper alongside the HTTP
//! service and shuts down on Ctrl-C.

use crate::{create_app, AppState, WebError, WebResult};
use axum::serve;
use medstock_core::MedstockConfig;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Main MedStock web server
pub struct MedstockServer {
    config: MedstockConfig,
    state: AppState,
}

impl MedstockServer {
    /// Open the configured database and prepare shared state
    pub async fn new(config: MedstockConfig) -> WebResult<Self> {
        let state = AppState::new(config.clone()).await?;
        Ok(Self { config, state })
    }

    /// Serve an already assembled state
    pub fn with_state(state: AppState) -> Self {
        Self {
            config: state.config.as_ref().clone(),
            state,
        }
    }

    /// Start the web server
    pub async fn start(self) -> WebResult<()> {
        let address = self.config.address();

        info!("Starting MedStock Web Server");
        info!("Server address: http://{}", address);

        let app = create_app(self.state.clone());

        let listener = TcpListener::bind(&address)
            .await
            .map_err(WebError::Server)?;

        info!("Server listening on http://{}", address);

        let sweeper = spawn_session_sweeper(
            self.state.clone(),
            self.config.session.sweep_interval_secs,
        );

        let result = serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        if let Some(handle) = sweeper {
            handle.abort();
        }

        if let Err(e) = result {
            error!("Server error: {}", e);
            return Err(WebError::Server(e));
        }

        info!("Server shut down gracefully");
        Ok(())
    }

    /// Get server configuration
    pub fn config(&self) -> &MedstockConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Periodically delete expired sessions. Returns `None` when the interval is 0.
pub fn spawn_session_sweeper(state: AppState, interval_secs: u64) -> Option<JoinHandle<()>> {
    if interval_secs == 0 {
        debug!("Session sweeper disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            state.cleanup_expired_sessions().await;
        }
    }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Builder for MedstockServer
pub struct MedstockServerBuilder {
    config: MedstockConfig,
}

impl MedstockServerBuilder {
    /// Create a new server builder with default configuration
    pub fn new() -> Self {
        Self {
            config: MedstockConfig::default(),
        }
    }

    /// Start from a resolved configuration
    pub fn from_config(config: MedstockConfig) -> Self {
        Self { config }
    }

    /// Set the server host
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.server.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    /// Set database URL
    pub fn database_url<S: Into<String>>(mut self, database_url: S) -> Self {
        self.config.database.url = database_url.into();
        self
    }

    /// Mark session cookies `Secure`
    pub fn secure_cookies(mut self, secure: bool) -> Self {
        self.config.server.secure_cookies = secure;
        self
    }

    /// Build the server
    pub async fn build(self) -> WebResult<MedstockServer> {
        self.config.validate()?;
        MedstockServer::new(self.config).await
    }
}

impl Default for MedstockServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_creation_in_memory() {
        let server = MedstockServerBuilder::new()
            .database_url("sqlite::memory:")
            .build()
            .await;
        assert!(server.is_ok());
    }

    #[tokio::test]
    async fn test_server_bootstraps_admin() {
        let mut config = MedstockConfig::default();
        config.database.url = "sqlite::memory:".to_string();
        config.bootstrap.admin_name = Some("admin".to_string());
        config.bootstrap.admin_password = Some("admin-pass".to_string());

        let server = MedstockServer::new(config).await.unwrap();
        // Already bootstrapped during construction
        assert!(!server.state().bootstrap_admin().await.unwrap());
    }

    #[test]
    fn test_server_builder() {
        let builder = MedstockServerBuilder::new()
            .host("localhost")
            .port(3000)
            .secure_cookies(true);

        assert_eq!(builder.config.server.host, "localhost");
        assert_eq!(builder.config.server.port, 3000);
        assert!(builder.config.server.secure_cookies);
    }

    #[tokio::test]
    async fn test_builder_rejects_invalid_config() {
        let result = MedstockServerBuilder::new().port(0).build().await;
        assert!(matches!(result, Err(WebError::Core(_))));
    }

    #[tokio::test]
    async fn test_sweeper_disabled_at_zero() {
        let server = MedstockServerBuilder::new()
            .database_url("sqlite::memory:")
            .build()
            .await
            .unwrap();
        assert!(spawn_session_sweeper(server.state().clone(), 0).is_none());
    }
}
