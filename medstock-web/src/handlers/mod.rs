//! HTTP request handlers for the MedStock web server
//!
//! This module contains all the HTTP request handlers organized by functionality.

pub mod auth;
pub mod health;
pub mod items;
pub mod transactions;
pub mod types;
pub mod users;

pub use auth::*;
pub use health::*;
pub use items::*;
pub use transactions::*;
pub use users::*;

pub use types::*;
