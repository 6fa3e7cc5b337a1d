//! Storage backends
//!
//! Four narrow traits describe what the services need from persistence.
//! [`MemoryStore`] and [`SqliteStore`] implement all of them, so one backend
//! instance can be shared behind each trait object.

mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

use crate::auth::UserRecord;
use crate::ledger::{Direction, Item, LedgerEntry, NewItem, TransactionFilter};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Storage-level failure
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("duplicate record: {0}")]
    Duplicate(String),

    /// The movement would take the quantity below zero
    #[error("insufficient stock: {available} available, {requested} requested")]
    InsufficientStock { available: i64, requested: i64 },

    #[error("storage backend failure: {message}")]
    Backend {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn backend<S: Into<String>>(message: S) -> Self {
        Self::Backend {
            message: message.into(),
            source: None,
        }
    }
}

/// Persisted session row. Only the token digest is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub token_hash: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Session row joined with its owning user
#[derive(Debug, Clone)]
pub struct StoredSession {
    pub record: SessionRecord,
    pub owner: UserRecord,
}

/// A movement as handed to the store, already validated
#[derive(Debug, Clone)]
pub struct NewMovement {
    pub item_id: i64,
    pub direction: Direction,
    /// Magnitude, always >= 1
    pub quantity: i64,
    pub notes: Option<String>,
    pub user: String,
    pub at: DateTime<Utc>,
}

/// Result of an applied movement: the item after the change and its entry
#[derive(Debug, Clone)]
pub struct AppliedMovement {
    pub item: Item,
    pub entry: LedgerEntry,
}

/// User accounts
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Exact, case-sensitive name lookup
    async fn find_user_by_name(&self, name: &str) -> StoreResult<Option<UserRecord>>;

    /// Insert a user; a taken name fails with [`StoreError::Duplicate`]
    async fn insert_user(&self, user: &UserRecord) -> StoreResult<()>;

    /// All users, newest first
    async fn list_users(&self) -> StoreResult<Vec<UserRecord>>;

    async fn count_users(&self) -> StoreResult<u64>;
}

/// Login sessions
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert the session and stamp the owner's `last_login` in one unit
    async fn create_session(&self, session: &SessionRecord) -> StoreResult<()>;

    async fn find_session(&self, token_hash: &str) -> StoreResult<Option<StoredSession>>;

    /// Returns whether a row was removed
    async fn delete_session(&self, token_hash: &str) -> StoreResult<bool>;

    /// Remove every session with `expires_at <= now`
    async fn delete_expired(&self, now: DateTime<Utc>) -> StoreResult<u64>;
}

/// Item catalog
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_item(&self, id: i64) -> StoreResult<Option<Item>>;

    /// All items, newest first
    async fn list_items(&self) -> StoreResult<Vec<Item>>;

    /// Catalog intake; the initial quantity is the baseline of the ledger
    async fn insert_item(&self, item: &NewItem, at: DateTime<Utc>) -> StoreResult<Item>;
}

/// Quantity changes and the append-only ledger.
///
/// Entries are never updated or deleted. Quantities are only written through
/// [`InventoryStore::apply_movement`].
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Apply the signed delta to the item and append the ledger entry as one
    /// atomic unit. Fails with [`StoreError::NotFound`] for an unknown item and
    /// [`StoreError::InsufficientStock`] if the quantity would go negative;
    /// in both cases nothing is written.
    async fn apply_movement(&self, movement: &NewMovement) -> StoreResult<AppliedMovement>;

    /// Entries newest first (`created_at`, ties by id)
    async fn list_entries(&self, filter: &TransactionFilter) -> StoreResult<Vec<LedgerEntry>>;
}
