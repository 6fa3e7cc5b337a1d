//! Authentication and authorization
//!
//! - [`SessionManager`]: login, token validation, logout, expiry sweep
//! - [`authorize`] / [`require`]: the two-role gate
//! - [`UserAdmin`]: admin-only account management and bootstrap
//! - [`PasswordHasher`]: the opaque hash/verify capability

pub mod authorization;
pub mod credentials;
pub mod password;
pub mod role;
pub mod session;
pub mod users;

pub use authorization::{authorize, require};
pub use credentials::{NewUser, UserInfo, UserRecord};
pub use password::{Argon2Hasher, PasswordHasher};
pub use role::Role;
pub use session::{Session, SessionInfo, SessionManager};
pub use users::UserAdmin;
