use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use domain::{Order, OrderStatus, User};
use sqlx::{PgPool, Row, postgres::PgPoolOptions, postgres::PgRow};

use crate::{
    Result, StoreError,
    store::{OrderRepository, UserRepository},
};

const USERS_EMAIL_KEY: &str = "users_email_key";

/// Opens a connection pool.
pub async fn connect(url: &str, max_connections: u32, acquire_timeout: Duration) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect(url)
        .await?;
    Ok(pool)
}

/// Runs the database migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    tracing::info!("database migrations applied");
    Ok(())
}

fn to_db_id(id: u64) -> Option<i64> {
    i64::try_from(id).ok()
}

fn from_db_id(id: i64) -> Result<u64> {
    u64::try_from(id).map_err(|_| StoreError::Corrupt(format!("negative id {id}")))
}

/// PostgreSQL-backed order repository.
#[derive(Clone)]
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    /// Creates a new PostgreSQL order repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;
        Ok(Order {
            id: OrderId::new(from_db_id(row.try_get("id")?)?),
            user_id: UserId::new(from_db_id(row.try_get("user_id")?)?),
            total: row.try_get("total")?,
            status: status
                .parse::<OrderStatus>()
                .map_err(|e| StoreError::Corrupt(e.to_string()))?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn create(&self, order: &mut Order) -> Result<()> {
        let user_id = to_db_id(order.user_id.as_u64())
            .ok_or_else(|| StoreError::Corrupt(format!("user id {} out of range", order.user_id)))?;

        let row = sqlx::query(
            r#"
            INSERT INTO orders (user_id, total, status)
            VALUES ($1, $2, $3)
            RETURNING id, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(order.total)
        .bind(order.status.as_str())
        .fetch_one(&self.pool)
        .await?;

        order.id = OrderId::new(from_db_id(row.try_get("id")?)?);
        order.created_at = row.try_get("created_at")?;
        order.updated_at = row.try_get("updated_at")?;
        Ok(())
    }

    async fn get_by_id(&self, id: OrderId) -> Result<Order> {
        let Some(db_id) = to_db_id(id.as_u64()) else {
            return Err(StoreError::order_not_found(id));
        };

        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT id, user_id, total, status, created_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(db_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_order(row),
            None => Err(StoreError::order_not_found(id)),
        }
    }

    async fn update(&self, order: &mut Order) -> Result<()> {
        let (Some(db_id), Some(user_id)) =
            (to_db_id(order.id.as_u64()), to_db_id(order.user_id.as_u64()))
        else {
            return Err(StoreError::order_not_found(order.id));
        };

        let updated_at: Option<DateTime<Utc>> = sqlx::query_scalar(
            r#"
            UPDATE orders
            SET user_id = $2, total = $3, status = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING updated_at
            "#,
        )
        .bind(db_id)
        .bind(user_id)
        .bind(order.total)
        .bind(order.status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        order.updated_at = updated_at.ok_or_else(|| StoreError::order_not_found(order.id))?;
        Ok(())
    }

    async fn delete(&self, id: OrderId) -> Result<()> {
        let Some(db_id) = to_db_id(id.as_u64()) else {
            return Err(StoreError::order_not_found(id));
        };

        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(db_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::order_not_found(id));
        }
        Ok(())
    }

    async fn get_by_user_id(&self, user_id: UserId) -> Result<Vec<Order>> {
        let Some(db_user_id) = to_db_id(user_id.as_u64()) else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query(
            r#"
            SELECT id, user_id, total, status, created_at, updated_at
            FROM orders
            WHERE user_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(db_user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }
}

/// PostgreSQL-backed user repository.
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a new PostgreSQL user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_user(row: PgRow) -> Result<User> {
        Ok(User {
            id: UserId::new(from_db_id(row.try_get("id")?)?),
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    async fn fetch_one_where(&self, column: &str, bind: UserKey<'_>) -> Result<Option<User>> {
        let sql = format!(
            "SELECT id, name, email, created_at, updated_at FROM users WHERE {column} = $1"
        );
        let query = sqlx::query(&sql);
        let query = match bind {
            UserKey::Id(id) => query.bind(id),
            UserKey::Email(email) => query.bind(email),
        };
        query
            .fetch_optional(&self.pool)
            .await?
            .map(Self::row_to_user)
            .transpose()
    }
}

enum UserKey<'a> {
    Id(i64),
    Email(&'a str),
}

/// Maps a unique violation on `users.email` to `DuplicateEmail`.
fn map_user_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.constraint() == Some(USERS_EMAIL_KEY)
    {
        return StoreError::DuplicateEmail;
    }
    StoreError::Database(err)
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: &mut User) -> Result<()> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (name, email)
            VALUES ($1, $2)
            RETURNING id, created_at, updated_at
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .fetch_one(&self.pool)
        .await
        .map_err(map_user_write_error)?;

        user.id = UserId::new(from_db_id(row.try_get("id")?)?);
        user.created_at = row.try_get("created_at")?;
        user.updated_at = row.try_get("updated_at")?;
        Ok(())
    }

    async fn get_by_id(&self, id: UserId) -> Result<User> {
        let Some(db_id) = to_db_id(id.as_u64()) else {
            return Err(StoreError::user_not_found(id));
        };
        self.fetch_one_where("id", UserKey::Id(db_id))
            .await?
            .ok_or_else(|| StoreError::user_not_found(id))
    }

    async fn get_by_email(&self, email: &str) -> Result<User> {
        self.fetch_one_where("email", UserKey::Email(email))
            .await?
            .ok_or_else(|| StoreError::user_not_found_by_email(email))
    }

    async fn update(&self, user: &mut User) -> Result<()> {
        let Some(db_id) = to_db_id(user.id.as_u64()) else {
            return Err(StoreError::user_not_found(user.id));
        };

        let updated_at: Option<DateTime<Utc>> = sqlx::query_scalar(
            r#"
            UPDATE users
            SET name = $2, email = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING updated_at
            "#,
        )
        .bind(db_id)
        .bind(&user.name)
        .bind(&user.email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_user_write_error)?;

        user.updated_at = updated_at.ok_or_else(|| StoreError::user_not_found(user.id))?;
        Ok(())
    }

    async fn delete(&self, id: UserId) -> Result<()> {
        let Some(db_id) = to_db_id(id.as_u64()) else {
            return Err(StoreError::user_not_found(id));
        };

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(db_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::user_not_found(id));
        }
        Ok(())
    }
}
