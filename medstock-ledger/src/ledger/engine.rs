//! Movement application and ledger reads

use super::types::{LedgerEntry, MovementOutcome, MovementRequest, TransactionFilter};
use crate::auth::{require, Role, SessionInfo};
use crate::store::{CatalogStore, InventoryStore, NewMovement, StoreError};
use crate::{LedgerError, LedgerResult};
use medstock_core::SharedClock;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Stock ledger engine
#[derive(Clone)]
pub struct StockLedger {
    pub(super) catalog: Arc<dyn CatalogStore>,
    pub(super) inventory: Arc<dyn InventoryStore>,
    pub(super) clock: SharedClock,
}

impl StockLedger {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        inventory: Arc<dyn InventoryStore>,
        clock: SharedClock,
    ) -> Self {
        Self {
            catalog,
            inventory,
            clock,
        }
    }

    /// Apply a stock movement on behalf of the session's user.
    ///
    /// A stock-out larger than the current quantity is rejected with
    /// [`LedgerError::InsufficientStock`]. Every failure leaves both the item
    /// and the ledger untouched. Movements are not deduplicated: submitting
    /// the same request twice records two entries.
    pub async fn apply_movement(
        &self,
        session: &SessionInfo,
        request: MovementRequest,
    ) -> LedgerResult<MovementOutcome> {
        require(session, Role::User)?;
        let notes = request.validated_notes()?;

        let movement = NewMovement {
            item_id: request.item_id,
            direction: request.direction,
            quantity: request.quantity,
            notes,
            user: session.name.clone(),
            at: self.clock.now(),
        };

        let applied = match self.inventory.apply_movement(&movement).await {
            Ok(applied) => applied,
            Err(StoreError::NotFound) => {
                return Err(LedgerError::not_found(format!(
                    "Item {} not found",
                    movement.item_id
                )))
            }
            Err(StoreError::InsufficientStock {
                available,
                requested,
            }) => {
                debug!(
                    item_id = movement.item_id,
                    available,
                    requested,
                    "Stock-out rejected"
                );
                return Err(LedgerError::InsufficientStock {
                    available,
                    requested,
                });
            }
            Err(e) => {
                error!(item_id = movement.item_id, error = %e, "Failed to apply movement");
                return Err(e.into());
            }
        };

        info!(
            item_id = applied.item.id,
            direction = %applied.entry.direction,
            quantity = applied.entry.quantity,
            new_quantity = applied.item.quantity,
            user = %session.name,
            "Stock movement recorded"
        );

        Ok(MovementOutcome {
            item: applied.item.into(),
            transaction: applied.entry,
        })
    }

    /// Ledger entries, newest first
    pub async fn list_transactions(
        &self,
        session: &SessionInfo,
        filter: &TransactionFilter,
    ) -> LedgerResult<Vec<LedgerEntry>> {
        require(session, Role::User)?;

        let entries = self.inventory.list_entries(filter).await?;
        debug!(
            item_id = ?filter.item_id,
            count = entries.len(),
            "Listed transactions"
        );
        Ok(entries)
    }
}
