use common::{AppError, OrderId, UserId};
use domain::UserError;
use thiserror::Error;

/// Errors that can occur when interacting with a record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record with the given key exists.
    #[error("{resource} with id '{id}' not found")]
    NotFound { resource: &'static str, id: String },

    /// The `users.email` uniqueness constraint was violated.
    #[error("email already exists")]
    DuplicateEmail,

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row could not be mapped back to a domain value.
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn order_not_found(id: OrderId) -> Self {
        Self::NotFound {
            resource: "order",
            id: id.to_string(),
        }
    }

    pub fn user_not_found(id: UserId) -> Self {
        Self::NotFound {
            resource: "user",
            id: id.to_string(),
        }
    }

    pub fn user_not_found_by_email(email: &str) -> Self {
        Self::NotFound {
            resource: "user",
            id: email.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { resource, ref id } => AppError::not_found(resource, id),
            StoreError::DuplicateEmail => UserError::EmailExists.into(),
            StoreError::Database(_) | StoreError::Migration(_) | StoreError::Corrupt(_) => {
                AppError::internal("storage failure").with_source(err)
            }
        }
    }
}

/// Result type for record store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
