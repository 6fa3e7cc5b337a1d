//! Password hashing capability

use crate::{LedgerError, LedgerResult};
use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

/// Opaque one-way hash and verification of passwords
pub trait PasswordHasher: Send + Sync + std::fmt::Debug {
    /// Produce a self-describing hash string for storage
    fn hash(&self, password: &str) -> LedgerResult<String>;

    /// Check a password against a stored hash. Malformed hashes never verify.
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Argon2id hasher producing PHC strings
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl Argon2Hasher {
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    /// Minimum-cost parameters for tests and local development.
    ///
    /// Hashes remain verifiable by any instance since the parameters are
    /// encoded in the PHC string.
    pub fn low_cost() -> LedgerResult<Self> {
        let params = Params::new(Params::MIN_M_COST, 1, 1, None)
            .map_err(|e| LedgerError::internal(format!("Invalid argon2 parameters: {}", e)))?;
        Ok(Self::new(params))
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> LedgerResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| LedgerError::internal(format!("Password hashing failed: {}", e)))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            return false;
        };

        self.argon2()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hasher = Argon2Hasher::low_cost().unwrap();
        let hash = hasher.hash("correct horse").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("correct horse", &hash));
        assert!(!hasher.verify("battery staple", &hash));
    }

    #[test]
    fn salts_differ_between_hashes() {
        let hasher = Argon2Hasher::low_cost().unwrap();
        assert_ne!(hasher.hash("same").unwrap(), hasher.hash("same").unwrap());
    }

    #[test]
    fn malformed_hash_never_verifies() {
        let hasher = Argon2Hasher::low_cost().unwrap();
        assert!(!hasher.verify("anything", "not-a-phc-string"));
        assert!(!hasher.verify("", ""));
    }

    #[test]
    fn hashing_failure_is_internal_not_retryable() {
        // PHC output is capped at 64 bytes
        let params = Params::new(Params::MIN_M_COST, 1, 1, Some(128)).unwrap();
        let err = Argon2Hasher::new(params).hash("correct horse").unwrap_err();

        assert!(matches!(err, LedgerError::Internal { .. }));
        assert!(!err.is_retryable());
    }
}
