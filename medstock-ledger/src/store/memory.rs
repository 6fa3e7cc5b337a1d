//! In-memory backend
//!
//! All state sits behind one lock, so every trait method is atomic with
//! respect to every other.

use super::{
    AppliedMovement, CatalogStore, CredentialStore, InventoryStore, NewMovement, SessionRecord,
    SessionStore, StoreError, StoreResult, StoredSession,
};
use crate::auth::UserRecord;
use crate::ledger::{Item, LedgerEntry, NewItem, TransactionFilter};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct MemoryState {
    /// Keyed by user id
    users: HashMap<String, UserRecord>,
    /// Keyed by token digest
    sessions: HashMap<String, SessionRecord>,
    items: BTreeMap<i64, Item>,
    entries: Vec<LedgerEntry>,
    next_item_id: i64,
    next_entry_id: i64,
}

/// Process-local store for tests and development
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_user_by_name(&self, name: &str) -> StoreResult<Option<UserRecord>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.name == name).cloned())
    }

    async fn insert_user(&self, user: &UserRecord) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.name == user.name) {
            return Err(StoreError::Duplicate(format!("users.name: {}", user.name)));
        }
        if state.users.contains_key(&user.id) {
            return Err(StoreError::Duplicate(format!("users.id: {}", user.id)));
        }
        state.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn list_users(&self) -> StoreResult<Vec<UserRecord>> {
        let state = self.state.read().await;
        let mut users: Vec<UserRecord> = state.users.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.name.cmp(&b.name)));
        Ok(users)
    }

    async fn count_users(&self) -> StoreResult<u64> {
        Ok(self.state.read().await.users.len() as u64)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(&self, session: &SessionRecord) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.sessions.contains_key(&session.token_hash) {
            return Err(StoreError::Duplicate("sessions.token_hash".to_string()));
        }
        let user = state
            .users
            .get_mut(&session.user_id)
            .ok_or(StoreError::NotFound)?;
        user.last_login = Some(session.created_at);
        state
            .sessions
            .insert(session.token_hash.clone(), session.clone());
        Ok(())
    }

    async fn find_session(&self, token_hash: &str) -> StoreResult<Option<StoredSession>> {
        let state = self.state.read().await;
        let Some(record) = state.sessions.get(token_hash) else {
            return Ok(None);
        };
        Ok(state.users.get(&record.user_id).map(|owner| StoredSession {
            record: record.clone(),
            owner: owner.clone(),
        }))
    }

    async fn delete_session(&self, token_hash: &str) -> StoreResult<bool> {
        Ok(self
            .state
            .write()
            .await
            .sessions
            .remove(token_hash)
            .is_some())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let mut state = self.state.write().await;
        let before = state.sessions.len();
        state.sessions.retain(|_, s| s.expires_at > now);
        Ok((before - state.sessions.len()) as u64)
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn get_item(&self, id: i64) -> StoreResult<Option<Item>> {
        Ok(self.state.read().await.items.get(&id).cloned())
    }

    async fn list_items(&self) -> StoreResult<Vec<Item>> {
        let state = self.state.read().await;
        Ok(state.items.values().rev().cloned().collect())
    }

    async fn insert_item(&self, item: &NewItem, at: DateTime<Utc>) -> StoreResult<Item> {
        let mut state = self.state.write().await;
        state.next_item_id += 1;

        let stored = Item {
            id: state.next_item_id,
            name: item.name.clone(),
            description: item.description.clone(),
            category: item.category.clone(),
            unit: item.unit.clone(),
            price: item.price,
            supplier: item.supplier.clone(),
            location: item.location.clone(),
            batch_number: item.batch_number.clone(),
            expiry_date: item.expiry_date,
            quantity: item.quantity,
            min_stock: item.min_stock,
            last_updated: at,
        };
        state.items.insert(stored.id, stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn apply_movement(&self, movement: &NewMovement) -> StoreResult<AppliedMovement> {
        let mut state = self.state.write().await;

        let (available, item_name) = state
            .items
            .get(&movement.item_id)
            .map(|item| (item.quantity, item.name.clone()))
            .ok_or(StoreError::NotFound)?;
        let new_quantity = available
            .checked_add(movement.direction.signed(movement.quantity))
            .ok_or_else(|| StoreError::backend("quantity overflow"))?;
        if new_quantity < 0 {
            return Err(StoreError::InsufficientStock {
                available,
                requested: movement.quantity,
            });
        }

        state.next_entry_id += 1;
        let entry = LedgerEntry {
            id: state.next_entry_id,
            item_id: movement.item_id,
            item_name,
            quantity: movement.quantity,
            direction: movement.direction,
            notes: movement.notes.clone(),
            user: movement.user.clone(),
            created_at: movement.at,
        };

        let item = state
            .items
            .get_mut(&movement.item_id)
            .ok_or(StoreError::NotFound)?;
        item.quantity = new_quantity;
        item.last_updated = movement.at;
        let item = item.clone();

        state.entries.push(entry.clone());
        Ok(AppliedMovement { item, entry })
    }

    async fn list_entries(&self, filter: &TransactionFilter) -> StoreResult<Vec<LedgerEntry>> {
        let state = self.state.read().await;
        let mut entries: Vec<LedgerEntry> = state
            .entries
            .iter()
            .filter(|e| filter.item_id.map_or(true, |id| e.item_id == id))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        entries.truncate(filter.effective_limit() as usize);
        Ok(entries)
    }
}
