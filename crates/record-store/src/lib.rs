//! Record store for users and orders.
//!
//! Repositories are exposed as traits so the services depend only on the
//! contract; in-memory and PostgreSQL backends implement it.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::{InMemoryOrderRepository, InMemoryUserRepository};
pub use postgres::{PostgresOrderRepository, PostgresUserRepository, connect, run_migrations};
pub use sqlx::PgPool;
pub use store::{OrderRepository, UserRepository};
