use thiserror::Error;

/// Errors produced by the session and credential layer.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The token is revoked, expired, malformed, or carries a bad signature.
    /// Callers treat every one of these identically.
    #[error("Invalid token")]
    InvalidToken,

    /// The reset code is unknown (never issued, or already consumed).
    #[error("Invalid reset code")]
    InvalidResetCode,

    /// The password does not meet the minimum requirements.
    #[error("Invalid password")]
    InvalidPassword,

    /// Password hashing failed internally.
    #[error("Password hashing error: {0}")]
    Hash(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AuthError>;
