use async_trait::async_trait;
use common::RpcStatus;

use crate::RpcRequest;
use crate::messages::{
    CreateOrderRequest, CreateUserRequest, GetOrderRequest, GetUserRequest, OrderReply, UserReply,
};

pub const USERS_GET_USER: &str = "/users.v1.UserService/GetUser";
pub const USERS_CREATE_USER: &str = "/users.v1.UserService/CreateUser";
pub const ORDERS_GET_ORDER: &str = "/orders.v1.OrderService/GetOrder";
pub const ORDERS_CREATE_ORDER: &str = "/orders.v1.OrderService/CreateOrder";

/// Users service as seen over RPC.
///
/// Implemented by the users service itself and by any transport client.
#[async_trait]
pub trait UserRpc: Send + Sync {
    async fn get_user(&self, request: RpcRequest<GetUserRequest>) -> Result<UserReply, RpcStatus>;

    async fn create_user(
        &self,
        request: RpcRequest<CreateUserRequest>,
    ) -> Result<UserReply, RpcStatus>;
}

/// Orders service as seen over RPC.
#[async_trait]
pub trait OrderRpc: Send + Sync {
    async fn get_order(&self, request: RpcRequest<GetOrderRequest>)
    -> Result<OrderReply, RpcStatus>;

    async fn create_order(
        &self,
        request: RpcRequest<CreateOrderRequest>,
    ) -> Result<OrderReply, RpcStatus>;
}
