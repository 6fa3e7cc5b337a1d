//! SQLite backend
//!
//! Timestamps are stored as fixed-width RFC 3339 text (microseconds, `Z`),
//! so lexical order in SQL matches chronological order.

use super::{
    AppliedMovement, CatalogStore, CredentialStore, InventoryStore, NewMovement, SessionRecord,
    SessionStore, StoreError, StoreResult, StoredSession,
};
use crate::auth::{Role, UserRecord};
use crate::ledger::{Direction, Item, LedgerEntry, NewItem, TransactionFilter};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL CHECK (role IN ('user', 'admin')),
        created_at TEXT NOT NULL,
        last_login TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sessions (
        token_hash TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES users(id),
        created_at TEXT NOT NULL,
        expires_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at)",
    r#"
    CREATE TABLE IF NOT EXISTS items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        description TEXT,
        category TEXT,
        unit TEXT,
        price REAL,
        supplier TEXT,
        location TEXT,
        batch_number TEXT,
        expiry_date TEXT,
        quantity INTEGER NOT NULL CHECK (quantity >= 0),
        min_stock INTEGER NOT NULL DEFAULT 0 CHECK (min_stock >= 0),
        last_updated TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS transactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        item_id INTEGER NOT NULL REFERENCES items(id),
        item_name TEXT NOT NULL,
        quantity INTEGER NOT NULL CHECK (quantity > 0),
        direction TEXT NOT NULL CHECK (direction IN ('in', 'out')),
        notes TEXT,
        user_name TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_transactions_item ON transactions(item_id, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_transactions_created_at ON transactions(created_at)",
    r#"
    CREATE TRIGGER IF NOT EXISTS transactions_no_update
    BEFORE UPDATE ON transactions
    BEGIN
        SELECT RAISE(ABORT, 'ledger entries are append-only');
    END
    "#,
    r#"
    CREATE TRIGGER IF NOT EXISTS transactions_no_delete
    BEFORE DELETE ON transactions
    BEGIN
        SELECT RAISE(ABORT, 'ledger entries are append-only');
    END
    "#,
];

const ITEM_COLUMNS: &str = "id, name, description, category, unit, price, supplier, location, \
                            batch_number, expiry_date, quantity, min_stock, last_updated";
const ENTRY_COLUMNS: &str =
    "id, item_id, item_name, quantity, direction, notes, user_name, created_at";

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        if let Some(db_error) = error.as_database_error() {
            if db_error.is_unique_violation() {
                return StoreError::Duplicate(db_error.message().to_string());
            }
        }
        StoreError::Backend {
            message: error.to_string(),
            source: Some(Box::new(error)),
        }
    }
}

/// SQLite-backed store
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database and its schema.
    ///
    /// In-memory URLs are pinned to a single, never-recycled connection so
    /// every task sees the same database.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        info!("Connecting to database: {}", database_url);

        let pool = if is_memory_url(database_url) {
            let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            let db_path = file_path(database_url);
            if let Some(parent) = Path::new(db_path).parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    info!("Creating database directory: {}", parent.display());
                    std::fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
                        message: format!("Failed to create directory: {}", e),
                        source: Some(Box::new(e)),
                    })?;
                }
            }

            let options = SqliteConnectOptions::new()
                .filename(db_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .busy_timeout(Duration::from_secs(5))
                .foreign_keys(true);
            SqlitePoolOptions::new()
                .max_connections(max_connections.max(1))
                .connect_with(options)
                .await?
        };

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, creating the schema if missing
    pub async fn from_pool(pool: SqlitePool) -> StoreResult<Self> {
        let store = Self { pool };
        store.create_tables().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn create_tables(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        debug!("Database schema ready");
        Ok(())
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// `sqlite://data/x.db?mode=rwc` -> `data/x.db`
fn file_path(url: &str) -> &str {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    path.split('?').next().unwrap_or(path)
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::backend(format!("Invalid timestamp {:?}: {}", value, e)))
}

fn parse_optional_timestamp(value: Option<String>) -> StoreResult<Option<DateTime<Utc>>> {
    value.as_deref().map(parse_timestamp).transpose()
}

fn user_from_row(row: &SqliteRow) -> StoreResult<UserRecord> {
    let role: String = row.try_get("role")?;
    Ok(UserRecord {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        password_hash: row.try_get("password_hash")?,
        role: Role::from_str(&role).map_err(StoreError::backend)?,
        created_at: parse_timestamp(row.try_get("created_at")?)?,
        last_login: parse_optional_timestamp(row.try_get("last_login")?)?,
    })
}

fn item_from_row(row: &SqliteRow) -> StoreResult<Item> {
    let expiry_date: Option<String> = row.try_get("expiry_date")?;
    let expiry_date = expiry_date
        .as_deref()
        .map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d"))
        .transpose()
        .map_err(|e| StoreError::backend(format!("Invalid expiry date: {}", e)))?;

    Ok(Item {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        category: row.try_get("category")?,
        unit: row.try_get("unit")?,
        price: row.try_get("price")?,
        supplier: row.try_get("supplier")?,
        location: row.try_get("location")?,
        batch_number: row.try_get("batch_number")?,
        expiry_date,
        quantity: row.try_get("quantity")?,
        min_stock: row.try_get("min_stock")?,
        last_updated: parse_timestamp(row.try_get("last_updated")?)?,
    })
}

fn entry_from_row(row: &SqliteRow) -> StoreResult<LedgerEntry> {
    let direction: String = row.try_get("direction")?;
    Ok(LedgerEntry {
        id: row.try_get("id")?,
        item_id: row.try_get("item_id")?,
        item_name: row.try_get("item_name")?,
        quantity: row.try_get("quantity")?,
        direction: Direction::from_str(&direction).map_err(StoreError::backend)?,
        notes: row.try_get("notes")?,
        user: row.try_get("user_name")?,
        created_at: parse_timestamp(row.try_get("created_at")?)?,
    })
}

#[async_trait]
impl CredentialStore for SqliteStore {
    async fn find_user_by_name(&self, name: &str) -> StoreResult<Option<UserRecord>> {
        let row = sqlx::query(
            "SELECT id, name, password_hash, role, created_at, last_login FROM users WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn insert_user(&self, user: &UserRecord) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, password_hash, role, created_at, last_login)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(timestamp(user.created_at))
        .bind(user.last_login.map(timestamp))
        .execute(&self.pool)
        .await?;

        debug!("Inserted user {}", user.name);
        Ok(())
    }

    async fn list_users(&self) -> StoreResult<Vec<UserRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, password_hash, role, created_at, last_login
            FROM users
            ORDER BY created_at DESC, name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(user_from_row).collect()
    }

    async fn count_users(&self) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn create_session(&self, session: &SessionRecord) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(timestamp(session.created_at))
            .bind(&session.user_id)
            .execute(&mut *tx)
            .await?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        sqlx::query(
            "INSERT INTO sessions (token_hash, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&session.token_hash)
        .bind(&session.user_id)
        .bind(timestamp(session.created_at))
        .bind(timestamp(session.expires_at))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_session(&self, token_hash: &str) -> StoreResult<Option<StoredSession>> {
        let row = sqlx::query(
            r#"
            SELECT s.token_hash, s.user_id, s.created_at AS session_created_at, s.expires_at,
                   u.id, u.name, u.password_hash, u.role, u.created_at, u.last_login
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token_hash = ?
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(StoredSession {
            record: SessionRecord {
                token_hash: row.try_get("token_hash")?,
                user_id: row.try_get("user_id")?,
                created_at: parse_timestamp(row.try_get("session_created_at")?)?,
                expires_at: parse_timestamp(row.try_get("expires_at")?)?,
            },
            owner: user_from_row(&row)?,
        }))
    }

    async fn delete_session(&self, token_hash: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(timestamp(now))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl CatalogStore for SqliteStore {
    async fn get_item(&self, id: i64) -> StoreResult<Option<Item>> {
        let row = sqlx::query(&format!("SELECT {} FROM items WHERE id = ?", ITEM_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(item_from_row).transpose()
    }

    async fn list_items(&self) -> StoreResult<Vec<Item>> {
        let rows = sqlx::query(&format!("SELECT {} FROM items ORDER BY id DESC", ITEM_COLUMNS))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(item_from_row).collect()
    }

    async fn insert_item(&self, item: &NewItem, at: DateTime<Utc>) -> StoreResult<Item> {
        let result = sqlx::query(
            r#"
            INSERT INTO items (name, description, category, unit, price, supplier, location,
                               batch_number, expiry_date, quantity, min_stock, last_updated)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&item.name)
        .bind(&item.description)
        .bind(&item.category)
        .bind(&item.unit)
        .bind(item.price)
        .bind(&item.supplier)
        .bind(&item.location)
        .bind(&item.batch_number)
        .bind(item.expiry_date.map(|d| d.format("%Y-%m-%d").to_string()))
        .bind(item.quantity)
        .bind(item.min_stock)
        .bind(timestamp(at))
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_item(id).await?.ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl InventoryStore for SqliteStore {
    async fn apply_movement(&self, movement: &NewMovement) -> StoreResult<AppliedMovement> {
        let delta = movement.direction.signed(movement.quantity);
        let at = timestamp(movement.at);

        let mut tx = self.pool.begin().await?;

        // The conditional UPDATE is the first statement so the write lock is
        // taken before anything is read.
        let updated = sqlx::query(
            r#"
            UPDATE items
            SET quantity = quantity + ?, last_updated = ?
            WHERE id = ? AND quantity + ? >= 0
            "#,
        )
        .bind(delta)
        .bind(&at)
        .bind(movement.item_id)
        .bind(delta)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            let available: Option<i64> = sqlx::query_scalar("SELECT quantity FROM items WHERE id = ?")
                .bind(movement.item_id)
                .fetch_optional(&mut *tx)
                .await?;
            tx.rollback().await?;

            return Err(match available {
                Some(available) => StoreError::InsufficientStock {
                    available,
                    requested: movement.quantity,
                },
                None => StoreError::NotFound,
            });
        }

        let row = sqlx::query(&format!("SELECT {} FROM items WHERE id = ?", ITEM_COLUMNS))
            .bind(movement.item_id)
            .fetch_one(&mut *tx)
            .await?;
        let item = item_from_row(&row)?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO transactions (item_id, item_name, quantity, direction, notes, user_name, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(item.id)
        .bind(&item.name)
        .bind(movement.quantity)
        .bind(movement.direction.as_str())
        .bind(&movement.notes)
        .bind(&movement.user)
        .bind(&at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let entry = LedgerEntry {
            id: inserted.last_insert_rowid(),
            item_id: item.id,
            item_name: item.name.clone(),
            quantity: movement.quantity,
            direction: movement.direction,
            notes: movement.notes.clone(),
            user: movement.user.clone(),
            created_at: parse_timestamp(&at)?,
        };

        Ok(AppliedMovement { item, entry })
    }

    async fn list_entries(&self, filter: &TransactionFilter) -> StoreResult<Vec<LedgerEntry>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM transactions
            WHERE (? IS NULL OR item_id = ?)
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
            ENTRY_COLUMNS
        ))
        .bind(filter.item_id)
        .bind(filter.item_id)
        .bind(i64::from(filter.effective_limit()))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(entry_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_paths_are_extracted_from_urls() {
        assert_eq!(file_path("sqlite:data/medstock.db"), "data/medstock.db");
        assert_eq!(file_path("sqlite://data/medstock.db?mode=rwc"), "data/medstock.db");
        assert_eq!(file_path("/var/lib/medstock.db"), "/var/lib/medstock.db");
    }

    #[test]
    fn memory_urls_are_detected() {
        assert!(is_memory_url("sqlite::memory:"));
        assert!(is_memory_url(":memory:"));
        assert!(is_memory_url("sqlite://file?mode=memory&cache=shared"));
        assert!(!is_memory_url("sqlite:data/medstock.db"));
    }

    #[test]
    fn timestamps_sort_lexically() {
        let early = DateTime::parse_from_rfc3339("2024-05-01T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let late = early + chrono::Duration::milliseconds(1);

        assert!(timestamp(early) < timestamp(late));
        assert_eq!(parse_timestamp(&timestamp(late)).unwrap(), late);
    }

    #[tokio::test]
    async fn ledger_rows_cannot_be_rewritten() {
        let store = SqliteStore::connect("sqlite::memory:", 1).await.unwrap();
        let item = store
            .insert_item(
                &NewItem {
                    name: "Bandage".to_string(),
                    quantity: 1,
                    ..Default::default()
                },
                Utc::now(),
            )
            .await
            .unwrap();
        store
            .apply_movement(&NewMovement {
                item_id: item.id,
                direction: Direction::In,
                quantity: 2,
                notes: None,
                user: "alice".to_string(),
                at: Utc::now(),
            })
            .await
            .unwrap();

        let update = sqlx::query("UPDATE transactions SET quantity = 99")
            .execute(store.pool())
            .await;
        assert!(update.is_err());

        let delete = sqlx::query("DELETE FROM transactions")
            .execute(store.pool())
            .await;
        assert!(delete.is_err());
    }
}
