use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use serde::{Deserialize, Serialize};

use super::{OrderError, OrderStatus};

/// Largest accepted order total (inclusive).
pub const MAX_ORDER_TOTAL: f64 = 1_000_000.0;

/// An order placed by a user.
///
/// `id`, `created_at` and `updated_at` are overwritten by the record store
/// when the order is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub total: f64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a validated order in `Pending` status.
    pub fn new(user_id: UserId, total: f64) -> Result<Self, OrderError> {
        let now = Utc::now();
        let order = Self {
            id: OrderId::unset(),
            user_id,
            total,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        order.validate()?;
        Ok(order)
    }

    /// Checks the order invariants: user first, then lower bound, then upper bound.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.user_id.is_unset() {
            return Err(OrderError::UserIdRequired);
        }
        // NaN fails this comparison as well
        if !(self.total > 0.0) {
            return Err(OrderError::InvalidTotal);
        }
        if self.total > MAX_ORDER_TOTAL {
            return Err(OrderError::TotalTooHigh);
        }
        Ok(())
    }

    /// Moves a pending order to `Confirmed`.
    pub fn confirm(&mut self) -> Result<(), OrderError> {
        if !self.status.can_confirm() {
            return Err(OrderError::InvalidStatusTransition {
                current: self.status,
                action: "confirm",
            });
        }
        self.status = OrderStatus::Confirmed;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Moves a pending order to `Cancelled`.
    pub fn cancel(&mut self) -> Result<(), OrderError> {
        if !self.status.can_cancel() {
            return Err(OrderError::InvalidStatusTransition {
                current: self.status,
                action: "cancel",
            });
        }
        self.status = OrderStatus::Cancelled;
        self.updated_at = Utc::now();
        Ok(())
    }
}
