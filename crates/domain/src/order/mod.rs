//! Order entity and related types.

mod entity;
mod state;

pub use entity::{MAX_ORDER_TOTAL, Order};
pub use state::{OrderStatus, UnknownOrderStatus};

use common::{AppError, UserId};
use serde_json::json;
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrderError {
    /// Owning user ID is missing.
    #[error("user_id is required")]
    UserIdRequired,

    /// Total is zero, negative or not a number.
    #[error("total must be greater than 0")]
    InvalidTotal,

    /// Total is above the allowed maximum.
    #[error("total cannot exceed 1,000,000")]
    TotalTooHigh,

    /// The referenced user does not exist.
    #[error("user not found")]
    UserNotFound { user_id: UserId },

    /// Order is not in a status that allows the requested transition.
    #[error("cannot {action} order in {current} status")]
    InvalidStatusTransition {
        current: OrderStatus,
        action: &'static str,
    },
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::UserNotFound { user_id } => AppError::validation(err.to_string())
                .with_details(json!({ "user_id": user_id.as_u64() })),
            OrderError::InvalidStatusTransition { .. } => AppError::conflict(err.to_string()),
            OrderError::UserIdRequired | OrderError::InvalidTotal | OrderError::TotalTooHigh => {
                AppError::validation(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ErrorKind;

    #[test]
    fn validation_errors_map_to_validation_kind() {
        for err in [
            OrderError::UserIdRequired,
            OrderError::InvalidTotal,
            OrderError::TotalTooHigh,
        ] {
            let message = err.to_string();
            let app: AppError = err.into();
            assert_eq!(app.kind(), ErrorKind::Validation);
            assert_eq!(app.message(), message);
        }
    }

    #[test]
    fn user_not_found_carries_user_id_detail() {
        let app: AppError = OrderError::UserNotFound {
            user_id: UserId::new(999),
        }
        .into();
        assert_eq!(app.kind(), ErrorKind::Validation);
        assert_eq!(app.message(), "user not found");
        assert_eq!(app.details(), Some(&json!({ "user_id": 999 })));
    }

    #[test]
    fn invalid_transition_is_conflict() {
        let app: AppError = OrderError::InvalidStatusTransition {
            current: OrderStatus::Cancelled,
            action: "confirm",
        }
        .into();
        assert_eq!(app.kind(), ErrorKind::Conflict);
        assert_eq!(app.message(), "cannot confirm order in cancelled status");
    }
}
