//! Wires record stores, event bus, services and RPC clients from a [`Config`].

use std::sync::Arc;

use event_bus::{BusConfig, BusError, EventBus, InMemoryEventBus};
use record_store::{
    InMemoryOrderRepository, InMemoryUserRepository, OrderRepository, PgPool,
    PostgresOrderRepository, PostgresUserRepository, StoreError, UserRepository, connect,
    run_migrations,
};
use rpc::{OrderRpcClient, UserRpcClient};
use services::{
    BusEventPublisher, OrderRpcServer, OrderService, RpcUserLookup, Timeouts,
    UserCreatedConsumer, UserRpcServer, UserService,
};
use thiserror::Error;

use crate::config::Config;
use crate::routes::AppState;

/// Failures while assembling the platform at startup.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("record store: {0}")]
    Store(#[from] StoreError),

    #[error("event bus: {0}")]
    Bus(#[from] BusError),
}

/// Everything the gateway needs at runtime.
pub struct Platform {
    pub state: AppState,
    /// Present when events are enabled.
    pub bus: Option<InMemoryEventBus>,
}

impl Platform {
    /// Stops event delivery.
    pub async fn shutdown(&self) {
        if let Some(bus) = &self.bus {
            bus.shutdown().await;
        }
    }
}

/// Builds both services and the gateway state.
///
/// Each service gets a PostgreSQL store when its database URL is configured
/// and an in-memory one otherwise.
pub async fn build(config: &Config) -> Result<Platform, BootstrapError> {
    let bus = config.events_enabled.then(|| {
        InMemoryEventBus::with_config(BusConfig {
            retry_delay: config.event_retry_delay,
            max_deliveries: config.event_max_deliveries,
            ..BusConfig::default()
        })
    });
    let publisher = bus
        .as_ref()
        .map(|bus| Arc::new(BusEventPublisher::new(Arc::new(bus.clone()))));

    let timeouts = Timeouts {
        lookup: config.rpc_timeout,
        storage: config.db_timeout,
        publish: config.publish_timeout,
    };

    let (user_repo, order_repo) = repositories(config).await?;

    let mut user_service = UserService::new(user_repo).with_timeouts(timeouts);
    if let Some(publisher) = &publisher {
        user_service = user_service.with_publisher(publisher.clone());
    }
    let user_server = UserRpcServer::new(Arc::new(user_service), config.rpc_timeout);
    let users = UserRpcClient::new(Arc::new(user_server), config.rpc_timeout);

    let mut order_service = OrderService::new(order_repo).with_timeouts(timeouts);
    if config.user_validation_enabled {
        order_service = order_service.with_user_lookup(Arc::new(RpcUserLookup::new(users.clone())));
    } else {
        tracing::warn!("user validation disabled, orders are accepted for any user id");
    }
    if let Some(publisher) = &publisher {
        order_service = order_service.with_publisher(publisher.clone());
    }
    let order_server = OrderRpcServer::new(Arc::new(order_service), config.rpc_timeout);
    let orders = OrderRpcClient::new(Arc::new(order_server), config.rpc_timeout);

    if let Some(bus) = &bus {
        UserCreatedConsumer::register(bus as &dyn EventBus).await?;
    }

    Ok(Platform {
        state: AppState { users, orders },
        bus,
    })
}

async fn repositories(
    config: &Config,
) -> Result<(Arc<dyn UserRepository>, Arc<dyn OrderRepository>), BootstrapError> {
    let users: Arc<dyn UserRepository> = match &config.users_database_url {
        Some(url) => Arc::new(PostgresUserRepository::new(open_pool(config, url).await?)),
        None => {
            tracing::info!("users service using in-memory record store");
            Arc::new(InMemoryUserRepository::new())
        }
    };
    let orders: Arc<dyn OrderRepository> = match &config.orders_database_url {
        Some(url) => Arc::new(PostgresOrderRepository::new(open_pool(config, url).await?)),
        None => {
            tracing::info!("orders service using in-memory record store");
            Arc::new(InMemoryOrderRepository::new())
        }
    };
    Ok((users, orders))
}

async fn open_pool(config: &Config, url: &str) -> Result<PgPool, StoreError> {
    let pool = connect(url, config.db_max_connections, config.db_timeout).await?;
    run_migrations(&pool).await?;
    tracing::info!(max_connections = config.db_max_connections, "database ready");
    Ok(pool)
}
