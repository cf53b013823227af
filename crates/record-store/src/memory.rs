use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, UserId};
use domain::{Order, User};
use tokio::sync::RwLock;

use crate::{
    Result, StoreError,
    store::{OrderRepository, UserRepository},
};

struct Table<K, V> {
    rows: BTreeMap<K, V>,
    last_id: u64,
}

impl<K, V> Default for Table<K, V> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }
}

impl<K, V> Table<K, V> {
    fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }
}

/// In-memory order repository for tests and local runs.
///
/// Identifiers are assigned from a counter starting at 1.
#[derive(Clone, Default)]
pub struct InMemoryOrderRepository {
    table: Arc<RwLock<Table<OrderId, Order>>>,
}

impl InMemoryOrderRepository {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn count(&self) -> usize {
        self.table.read().await.rows.len()
    }

    /// Removes all orders. The id counter keeps running.
    pub async fn clear(&self) {
        self.table.write().await.rows.clear();
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(&self, order: &mut Order) -> Result<()> {
        let mut table = self.table.write().await;
        let now = Utc::now();
        order.id = OrderId::new(table.next_id());
        order.created_at = now;
        order.updated_at = now;
        table.rows.insert(order.id, order.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: OrderId) -> Result<Order> {
        self.table
            .read()
            .await
            .rows
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::order_not_found(id))
    }

    async fn update(&self, order: &mut Order) -> Result<()> {
        let mut table = self.table.write().await;
        let row = table
            .rows
            .get_mut(&order.id)
            .ok_or_else(|| StoreError::order_not_found(order.id))?;
        order.created_at = row.created_at;
        order.updated_at = Utc::now();
        *row = order.clone();
        Ok(())
    }

    async fn delete(&self, id: OrderId) -> Result<()> {
        self.table
            .write()
            .await
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::order_not_found(id))
    }

    async fn get_by_user_id(&self, user_id: UserId) -> Result<Vec<Order>> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }
}

/// In-memory user repository enforcing email uniqueness.
#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    table: Arc<RwLock<Table<UserId, User>>>,
}

impl InMemoryUserRepository {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored users.
    pub async fn count(&self) -> usize {
        self.table.read().await.rows.len()
    }
}

fn email_taken(rows: &BTreeMap<UserId, User>, email: &str, except: UserId) -> bool {
    rows.values().any(|u| u.id != except && u.email == email)
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &mut User) -> Result<()> {
        let mut table = self.table.write().await;
        if email_taken(&table.rows, &user.email, UserId::unset()) {
            return Err(StoreError::DuplicateEmail);
        }
        let now = Utc::now();
        user.id = UserId::new(table.next_id());
        user.created_at = now;
        user.updated_at = now;
        table.rows.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: UserId) -> Result<User> {
        self.table
            .read()
            .await
            .rows
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::user_not_found(id))
    }

    async fn get_by_email(&self, email: &str) -> Result<User> {
        self.table
            .read()
            .await
            .rows
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| StoreError::user_not_found_by_email(email))
    }

    async fn update(&self, user: &mut User) -> Result<()> {
        let mut table = self.table.write().await;
        if !table.rows.contains_key(&user.id) {
            return Err(StoreError::user_not_found(user.id));
        }
        if email_taken(&table.rows, &user.email, user.id) {
            return Err(StoreError::DuplicateEmail);
        }
        if let Some(row) = table.rows.get_mut(&user.id) {
            user.created_at = row.created_at;
            user.updated_at = Utc::now();
            *row = user.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: UserId) -> Result<()> {
        self.table
            .write()
            .await
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::user_not_found(id))
    }
}
