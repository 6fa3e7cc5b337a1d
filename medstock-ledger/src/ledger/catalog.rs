//! Catalog reads and intake

use super::engine::StockLedger;
use super::types::{ItemView, NewItem};
use crate::auth::{require, Role, SessionInfo};
use crate::{LedgerError, LedgerResult};
use tracing::{debug, info};

impl StockLedger {
    pub async fn get_item(&self, session: &SessionInfo, id: i64) -> LedgerResult<ItemView> {
        require(session, Role::User)?;

        self.catalog
            .get_item(id)
            .await?
            .map(ItemView::from)
            .ok_or_else(|| LedgerError::not_found(format!("Item {} not found", id)))
    }

    /// All items, newest first
    pub async fn list_items(&self, session: &SessionInfo) -> LedgerResult<Vec<ItemView>> {
        require(session, Role::User)?;

        let items = self.catalog.list_items().await?;
        debug!(count = items.len(), "Listed items");
        Ok(items.into_iter().map(ItemView::from).collect())
    }

    /// Items at or below their minimum stock
    pub async fn low_stock_items(&self, session: &SessionInfo) -> LedgerResult<Vec<ItemView>> {
        Ok(self
            .list_items(session)
            .await?
            .into_iter()
            .filter(|view| view.is_low_stock)
            .collect())
    }

    /// Register a new item with its baseline quantity
    pub async fn create_item(
        &self,
        session: &SessionInfo,
        request: NewItem,
    ) -> LedgerResult<ItemView> {
        require(session, Role::User)?;
        let request = request.normalized()?;

        let item = self
            .catalog
            .insert_item(&request, self.clock.now())
            .await?;

        info!(
            item_id = item.id,
            name = %item.name,
            quantity = item.quantity,
            user = %session.name,
            "Item added to catalog"
        );
        Ok(item.into())
    }
}
