//! Type definitions for handlers
//!
//! Request/response types owned by the HTTP layer. Domain types
//! (items, ledger entries, users) come from `medstock-ledger`.

pub mod auth;
pub mod common;
pub mod transactions;

pub use auth::*;
pub use common::*;
pub use transactions::*;
