//! Stock ledger
//!
//! [`StockLedger`] applies stock movements and serves catalog reads. Item
//! quantities are a projection of the ledger: they change only through
//! [`StockLedger::apply_movement`], which writes the new quantity and the
//! ledger entry as one store-level atomic unit.

mod catalog;
mod engine;
pub mod types;

pub use engine::StockLedger;
pub use types::{
    Direction, Item, ItemView, LedgerEntry, MovementOutcome, MovementRequest, NewItem,
    TransactionFilter, DEFAULT_TRANSACTION_LIMIT, MAX_MOVEMENT_QUANTITY, MAX_TRANSACTION_LIMIT,
};
