//! Internal RPC plumbing between the gateway and the services.
//!
//! Services implement [`UserRpc`] / [`OrderRpc`]; callers go through the typed
//! clients, which run every call through a [`ClientInterceptor`]. Servers wrap
//! their handlers in a [`ServerInterceptor`]. The traits are the transport
//! seam: an in-process server can be handed straight to a client, and a
//! network transport implements the same traits.

pub mod client;
pub mod messages;
pub mod metadata;
pub mod server;
pub mod service;

pub use client::{ClientInterceptor, OrderRpcClient, UserRpcClient};
pub use messages::{
    CreateOrderRequest, CreateUserRequest, GetOrderRequest, GetUserRequest, OrderReply, UserReply,
};
pub use metadata::{Metadata, RpcRequest};
pub use server::ServerInterceptor;
pub use service::{OrderRpc, UserRpc};
