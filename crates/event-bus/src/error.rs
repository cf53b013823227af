use common::AppError;
use thiserror::Error;

/// Errors that can occur when interacting with the event bus.
#[derive(Debug, Error)]
pub enum BusError {
    /// A queue with this name is already bound.
    #[error("Queue already bound: {0}")]
    QueueExists(String),

    /// The bus has been shut down and accepts no more messages.
    #[error("Event bus is closed")]
    Closed,
}

impl From<BusError> for AppError {
    fn from(err: BusError) -> Self {
        AppError::internal("event bus failure").with_source(err)
    }
}

/// Result type for event bus operations.
pub type Result<T> = std::result::Result<T, BusError>;
