//! Error types for identity resolution

use thiserror::Error;

/// Identity resolution errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// Token is missing, malformed, expired or unknown
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// The identity backend could not be reached
    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Result type for identity operations.
pub type IdentityResult<T> = Result<T, IdentityError>;

impl IdentityError {
    /// Check if this error reflects a fault on our side rather than a bad token.
    pub fn is_server_error(&self) -> bool {
        matches!(self, IdentityError::Unavailable(_))
    }
}
