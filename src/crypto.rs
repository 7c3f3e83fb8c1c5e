//! Credential-hashing collaborator. The kernel never implements its own
//! hashing; bcrypt is the one-way primitive and the raw hash never leaves
//! the identity store.

use crate::config;
use crate::error::AuthError;

/// Hash a password with bcrypt at the configured cost.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, config::config().session.bcrypt_cost)
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// Verify a password against a bcrypt hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, hash).map_err(|e| AuthError::Hash(e.to_string()))
}
