//! MedStock Ledger - session authorization and stock movements
//!
//! This crate holds the domain core of MedStock:
//!
//! - Credential store and user administration
//! - Session manager issuing opaque, expiring, revocable tokens
//! - Authorization gate for the two-role (user/admin) model
//! - Stock ledger engine applying movements atomically against the catalog
//!
//! ## Architecture
//!
//! Services hold `Arc<dyn …Store>` handles and a [`medstock_core::SharedClock`].
//! Every operation that must preserve an invariant across two writes is a
//! single method on a store trait, so each backend decides how to make it
//! atomic (a SQL transaction for [`SqliteStore`], one lock for [`MemoryStore`]).

pub mod auth;
pub mod ledger;
pub mod store;

pub use auth::{
    authorize, require, Argon2Hasher, NewUser, PasswordHasher, Role, Session, SessionInfo,
    SessionManager, UserAdmin, UserInfo, UserRecord,
};
pub use ledger::{
    Direction, Item, ItemView, LedgerEntry, MovementOutcome, MovementRequest, NewItem,
    StockLedger, TransactionFilter,
};
pub use store::{
    CatalogStore, CredentialStore, InventoryStore, MemoryStore, SessionStore, StoreError,
};
#[cfg(feature = "sqlite")]
pub use store::SqliteStore;

/// Domain error type
///
/// Authentication and authorization variants intentionally carry no detail;
/// quantity and validation variants carry the specific reason.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Insufficient permissions")]
    Forbidden,

    #[error("Invalid quantity: {message}")]
    InvalidQuantity { message: String },

    #[error("Insufficient stock: {available} available, {requested} requested")]
    InsufficientStock { available: i64, requested: i64 },

    #[error("{message}")]
    Validation { field: String, message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Deterministic failure inside the service, e.g. password hashing
    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

pub type LedgerResult<T> = Result<T, LedgerError>;

impl LedgerError {
    /// Create an invalid quantity error
    pub fn invalid_quantity<S: Into<String>>(message: S) -> Self {
        Self::InvalidQuantity {
            message: message.into(),
        }
    }

    /// Create a validation error for a named field
    pub fn validation<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict<S: Into<String>>(message: S) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create an internal (non-retryable) error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Only storage failures are worth retrying unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid_credentials",
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "forbidden",
            Self::InvalidQuantity { .. } => "invalid_quantity",
            Self::InsufficientStock { .. } => "insufficient_stock",
            Self::Validation { .. } => "validation_error",
            Self::Conflict { .. } => "conflict",
            Self::NotFound { .. } => "not_found",
            Self::Internal { .. } => "internal_error",
            Self::Storage { .. } => "storage_error",
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound => Self::not_found("record"),
            StoreError::Duplicate(message) => Self::conflict(message),
            StoreError::InsufficientStock {
                available,
                requested,
            } => Self::InsufficientStock {
                available,
                requested,
            },
            StoreError::Backend { message, source } => Self::Storage { message, source },
        }
    }
}
