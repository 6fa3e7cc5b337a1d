//! MedStock Core - shared infrastructure
//!
//! Error types with context, configuration loading, logging bootstrap and the
//! clock abstraction used by every time-dependent check in the system.

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
pub use logging::*;

// Re-export commonly used external types
pub use tracing;
