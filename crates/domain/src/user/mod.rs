//! User entity and related types.

mod email;
mod entity;

pub use email::is_valid_email;
pub use entity::{MAX_NAME_CHARS, MIN_NAME_CHARS, User};

use common::AppError;
use thiserror::Error;

/// Errors that can occur during user operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserError {
    #[error("name is required")]
    NameRequired,

    #[error("name must be between 2 and 100 characters")]
    NameLength,

    #[error("email is required")]
    EmailRequired,

    #[error("email format is invalid")]
    EmailInvalid,

    /// Another user already owns this address.
    #[error("email already exists")]
    EmailExists,
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::EmailExists => AppError::conflict(err.to_string()),
            _ => AppError::validation(err.to_string()),
        }
    }
}
