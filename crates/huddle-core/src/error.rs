use huddle_auth::AuthError;
use huddle_store::StoreError;
use thiserror::Error;

/// Errors surfaced by operations.
///
/// Exactly two kinds are caller-visible: [`CoreError::InvalidInput`] for
/// malformed or semantically invalid input (unknown ids, oversized text,
/// duplicate emails, ...), and [`CoreError::Unauthorized`] for a missing,
/// bad or under-privileged token.  Both propagate unhandled to the boundary
/// layer, which maps them to user-visible responses.  [`CoreError::Internal`]
/// covers faults of the substrate itself (storage, hashing) and is never a
/// statement about the caller's input.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        CoreError::InvalidInput(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        CoreError::Unauthorized(msg.into())
    }
}

impl From<StoreError> for CoreError {
    fn from(e: StoreError) -> Self {
        let msg = e.to_string();
        match e {
            // An absent id or a violated entity constraint is the caller's
            // mistake, not a server fault.
            StoreError::NotFound(_) | StoreError::Invalid(_) => CoreError::InvalidInput(msg),
            _ => CoreError::Internal(msg),
        }
    }
}

impl From<AuthError> for CoreError {
    fn from(e: AuthError) -> Self {
        let msg = e.to_string();
        match e {
            AuthError::InvalidToken => CoreError::Unauthorized(msg),
            AuthError::InvalidResetCode | AuthError::InvalidPassword => {
                CoreError::InvalidInput(msg)
            }
            AuthError::Hash(_) => CoreError::Internal(msg),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CoreError>;
