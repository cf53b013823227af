use async_trait::async_trait;
use common::{OrderId, UserId};
use domain::{Order, User};

use crate::Result;

/// Persistence contract for orders.
///
/// Implementations must be safe for concurrent use by many requests.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Inserts a new order.
    ///
    /// On success `order.id`, `created_at` and `updated_at` are overwritten
    /// with the values assigned by the store.
    async fn create(&self, order: &mut Order) -> Result<()>;

    /// Fetches an order, failing with `NotFound` if absent.
    async fn get_by_id(&self, id: OrderId) -> Result<Order>;

    /// Persists changes to an existing order and refreshes `updated_at`.
    async fn update(&self, order: &mut Order) -> Result<()>;

    /// Deletes an order, failing with `NotFound` if nothing was deleted.
    async fn delete(&self, id: OrderId) -> Result<()>;

    /// Returns all orders owned by a user. No matches is an empty vec.
    async fn get_by_user_id(&self, user_id: UserId) -> Result<Vec<Order>>;
}

/// Persistence contract for users.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a new user. Fails with `DuplicateEmail` if the address is taken.
    async fn create(&self, user: &mut User) -> Result<()>;

    async fn get_by_id(&self, id: UserId) -> Result<User>;

    /// Looks a user up by exact email address.
    async fn get_by_email(&self, email: &str) -> Result<User>;

    async fn update(&self, user: &mut User) -> Result<()>;

    async fn delete(&self, id: UserId) -> Result<()>;
}
