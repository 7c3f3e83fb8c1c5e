// Caller-visible error taxonomy for the authorization core
use thiserror::Error;

use crate::store::StoreError;

/// Terminal, caller-visible failures. None of these are retried internally;
/// the only internally retried condition is the optimistic-concurrency
/// conflict on the activation aggregate, which surfaces as `Conflict` once
/// the retry budget is exhausted.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Identical for "no such account" and "wrong password" so login
    /// failures cannot be used to enumerate accounts.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Password was correct, but the reception activation gate is closed.
    /// Carries the current flags so a client can distinguish "still pending
    /// review" from "explicitly rejected, contact administrator".
    #[error("Account is not approved for login")]
    AccountNotApproved {
        documents_approved: bool,
        is_active: bool,
    },

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    /// Malformed creation request: creator role is not the required parent
    /// role, or a referenced edge is inconsistent.
    #[error("Invalid ownership: {0}")]
    InvalidOwnership(String),

    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    /// Re-reviewing a document that is already approved or rejected.
    #[error("Document is not pending review")]
    NotPending,

    /// Scope violation. The message never distinguishes wrong-role from
    /// not-owner, to avoid leaking the shape of the ownership graph.
    #[error("Forbidden")]
    Forbidden,

    /// Also used deliberately to mask existence where the scoping policy
    /// requires it (leaf resources probed across tenant boundaries).
    #[error("Not found")]
    NotFound,

    /// Concurrent activation recomputations exhausted the retry budget.
    #[error("Conflicting concurrent update, try again")]
    Conflict,

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    /// HTTP-equivalent status code, for the out-of-scope HTTP layer.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::InvalidCredentials => 401,
            AuthError::AccountNotApproved { .. } => 403,
            AuthError::InvalidToken => 401,
            AuthError::TokenExpired => 401,
            AuthError::InvalidOwnership(_) => 400,
            AuthError::DuplicateEmail(_) => 409,
            AuthError::NotPending => 409,
            AuthError::Forbidden => 403,
            AuthError::NotFound => 404,
            AuthError::Conflict => 409,
            AuthError::Hash(_) => 500,
            AuthError::Store(_) => 500,
        }
    }

    /// Stable code for client-side handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::AccountNotApproved { .. } => "ACCOUNT_NOT_APPROVED",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::InvalidOwnership(_) => "INVALID_OWNERSHIP",
            AuthError::DuplicateEmail(_) => "DUPLICATE_EMAIL",
            AuthError::NotPending => "NOT_PENDING",
            AuthError::Forbidden => "FORBIDDEN",
            AuthError::NotFound => "NOT_FOUND",
            AuthError::Conflict => "CONFLICT",
            AuthError::Hash(_) => "INTERNAL_ERROR",
            AuthError::Store(_) => "INTERNAL_ERROR",
        }
    }
}
