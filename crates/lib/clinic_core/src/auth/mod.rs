//! Authentication: password hashing and the signed session token service.

pub mod password;
pub mod session;

use thiserror::Error;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
