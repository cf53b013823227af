//! Request and reply messages of the users and orders services.

use chrono::SecondsFormat;
use domain::{Order, User};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetUserRequest {
    pub id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserReply {
    pub id: u64,
    pub name: String,
    pub email: String,
    /// RFC 3339 timestamp.
    pub created_at: String,
}

impl From<&User> for UserReply {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.as_u64(),
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: user.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetOrderRequest {
    pub id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: u64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReply {
    pub id: u64,
    pub user_id: u64,
    pub total: f64,
    pub status: String,
    /// RFC 3339 timestamp.
    pub created_at: String,
}

impl From<&Order> for OrderReply {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.as_u64(),
            user_id: order.user_id.as_u64(),
            total: order.total,
            status: order.status.to_string(),
            created_at: order.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}
