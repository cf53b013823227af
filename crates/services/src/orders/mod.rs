//! Orders service: the order creation workflow, the remote user check it
//! depends on, the `user.created` consumer and the RPC server.

mod consumer;
mod lookup;
mod server;
mod service;

pub use consumer::{USER_CREATED_QUEUE, UserCreatedConsumer};
pub use lookup::{InMemoryUserLookup, RpcUserLookup, UserInfo, UserLookup};
pub use server::OrderRpcServer;
pub use service::{CreateOrderInput, OrderService};
