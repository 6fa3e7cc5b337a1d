//! Configuration management
//!
//! Settings are resolved in three layers: built-in defaults, an optional TOML
//! file, then `MEDSTOCK_*` environment variables. Command-line flags are applied
//! on top by the binary.

use crate::error::{ErrorContext, MedstockError, MedstockResult};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Complete service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MedstockConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub bootstrap: BootstrapConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Mark the session cookie `Secure` (HTTPS deployments)
    pub secure_cookies: bool,
    /// Origins allowed to make credentialed cross-origin requests
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            secure_cookies: false,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

/// Relational store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx connection URL, e.g. `sqlite:data/medstock.db` or `sqlite::memory:`
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:data/medstock.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Session lifetime settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Absolute session lifetime from login
    pub ttl_hours: i64,
    /// Interval of the expired-session sweep; 0 disables it
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_hours: 24,
            sweep_interval_secs: 3600,
        }
    }
}

/// Initial administrator, created only when the credential store is empty
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub admin_name: Option<String>,
    pub admin_password: Option<String>,
}

impl BootstrapConfig {
    /// Both name and password, if configured
    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        match (&self.admin_name, &self.admin_password) {
            (Some(name), Some(password)) if !name.is_empty() && !password.is_empty() => {
                Some((name.as_str(), password.as_str()))
            }
            _ => None,
        }
    }
}

impl MedstockConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> MedstockResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| MedstockError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> MedstockResult<Self> {
        toml::from_str(content).map_err(|e| MedstockError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })
    }

    /// Resolve defaults, optional file and process environment, then validate
    pub fn load(path: Option<&Path>) -> MedstockResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_with(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `MEDSTOCK_*` overrides using the given variable lookup
    pub fn apply_env_with<F>(&mut self, lookup: F) -> MedstockResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("MEDSTOCK_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("MEDSTOCK_PORT") {
            self.server.port = parse_env("MEDSTOCK_PORT", &port)?;
        }
        if let Some(secure) = lookup("MEDSTOCK_SECURE_COOKIES") {
            self.server.secure_cookies = parse_env("MEDSTOCK_SECURE_COOKIES", &secure)?;
        }
        if let Some(origins) = lookup("MEDSTOCK_ALLOWED_ORIGINS") {
            self.server.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(max) = lookup("MEDSTOCK_DB_MAX_CONNECTIONS") {
            self.database.max_connections = parse_env("MEDSTOCK_DB_MAX_CONNECTIONS", &max)?;
        }
        if let Some(ttl) = lookup("MEDSTOCK_SESSION_TTL_HOURS") {
            self.session.ttl_hours = parse_env("MEDSTOCK_SESSION_TTL_HOURS", &ttl)?;
        }
        if let Some(sweep) = lookup("MEDSTOCK_SESSION_SWEEP_SECS") {
            self.session.sweep_interval_secs = parse_env("MEDSTOCK_SESSION_SWEEP_SECS", &sweep)?;
        }
        if let Some(name) = lookup("MEDSTOCK_ADMIN_NAME") {
            self.bootstrap.admin_name = Some(name);
        }
        if let Some(password) = lookup("MEDSTOCK_ADMIN_PASSWORD") {
            self.bootstrap.admin_password = Some(password);
        }
        if let Some(level) = lookup("MEDSTOCK_LOG_LEVEL") {
            self.logging.level = level;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> MedstockResult<()> {
        if self.server.port == 0 {
            return Err(invalid("server.port must be greater than 0"));
        }

        if self.database.url.trim().is_empty() {
            return Err(invalid("database.url must not be empty"));
        }

        if self.database.max_connections == 0 {
            return Err(invalid("database.max_connections must be greater than 0"));
        }

        if self.session.ttl_hours <= 0 {
            return Err(invalid("session.ttl_hours must be greater than 0"));
        }

        if let Some(password) = &self.bootstrap.admin_password {
            if password.len() < 6 {
                return Err(invalid(
                    "bootstrap.admin_password must be at least 6 characters",
                ));
            }
        }

        Ok(())
    }

    /// Listener address in `host:port` form
    pub fn address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> MedstockResult<T> {
    value.trim().parse().map_err(|_| MedstockError::Config {
        message: format!("Invalid value for {}: {:?}", key, value),
        source: None,
        context: ErrorContext::new("config")
            .with_operation("apply_env")
            .with_metadata("variable", key),
    })
}

fn invalid(message: &str) -> MedstockError {
    MedstockError::Config {
        message: message.to_string(),
        source: None,
        context: ErrorContext::new("config").with_operation("validate"),
    }
}
