//! Authorization gate
//!
//! Pure role checks evaluated against a freshly validated [`SessionInfo`].
//! Nothing here is cached; callers validate the session on every request.

use super::{Role, SessionInfo};
use crate::{LedgerError, LedgerResult};
use tracing::warn;

/// Whether the session satisfies the required role
pub fn authorize(session: &SessionInfo, required: Role) -> bool {
    match required {
        Role::User => true,
        Role::Admin => session.role == Role::Admin,
    }
}

/// Fallible form of [`authorize`], called before any storage access
pub fn require(session: &SessionInfo, required: Role) -> LedgerResult<()> {
    if authorize(session, required) {
        Ok(())
    } else {
        warn!(
            user = %session.name,
            role = %session.role,
            required = %required,
            "Access denied"
        );
        Err(LedgerError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn session(role: Role) -> SessionInfo {
        SessionInfo {
            user_id: "u-1".to_string(),
            name: "nurse".to_string(),
            role,
            expires_at: Utc::now() + Duration::hours(1),
        }
    }

    #[test]
    fn user_session_never_satisfies_admin() {
        assert!(!authorize(&session(Role::User), Role::Admin));
        assert!(matches!(
            require(&session(Role::User), Role::Admin),
            Err(LedgerError::Forbidden)
        ));
    }

    #[test]
    fn admin_includes_user() {
        assert!(authorize(&session(Role::Admin), Role::Admin));
        assert!(authorize(&session(Role::Admin), Role::User));
        assert!(authorize(&session(Role::User), Role::User));
    }
}
