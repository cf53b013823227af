use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{OrderId, RpcStatus, UserId};
use rpc::service::{ORDERS_CREATE_ORDER, ORDERS_GET_ORDER};
use rpc::{
    CreateOrderRequest, GetOrderRequest, OrderReply, OrderRpc, RpcRequest, ServerInterceptor,
};

use super::{CreateOrderInput, OrderService};

/// Exposes [`OrderService`] over RPC.
#[derive(Clone)]
pub struct OrderRpcServer {
    service: Arc<OrderService>,
    interceptor: ServerInterceptor,
}

impl OrderRpcServer {
    pub fn new(service: Arc<OrderService>, timeout: Duration) -> Self {
        Self {
            service,
            interceptor: ServerInterceptor::new(timeout),
        }
    }
}

#[async_trait]
impl OrderRpc for OrderRpcServer {
    async fn get_order(
        &self,
        request: RpcRequest<GetOrderRequest>,
    ) -> Result<OrderReply, RpcStatus> {
        self.interceptor
            .serve_unary(ORDERS_GET_ORDER, request, |ctx, req| async move {
                let order = self.service.get_order(&ctx, OrderId::new(req.id)).await?;
                Ok(OrderReply::from(&order))
            })
            .await
    }

    async fn create_order(
        &self,
        request: RpcRequest<CreateOrderRequest>,
    ) -> Result<OrderReply, RpcStatus> {
        self.interceptor
            .serve_unary(ORDERS_CREATE_ORDER, request, |ctx, req| async move {
                let input = CreateOrderInput {
                    user_id: UserId::new(req.user_id),
                    total: req.total,
                };
                let order = self.service.create_order(&ctx, input).await?;
                Ok(OrderReply::from(&order))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{RpcCode, TraceId};
    use record_store::InMemoryOrderRepository;

    fn server() -> OrderRpcServer {
        let service = OrderService::new(Arc::new(InMemoryOrderRepository::new()));
        OrderRpcServer::new(Arc::new(service), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn create_then_get() {
        let server = server();
        let created = server
            .create_order(
                RpcRequest::new(CreateOrderRequest {
                    user_id: 1,
                    total: 99.99,
                })
                .with_trace_id(&TraceId::from("trace-1")),
            )
            .await
            .unwrap();
        assert_eq!(created.status, "pending");

        let fetched = server
            .get_order(RpcRequest::new(GetOrderRequest { id: created.id }))
            .await
            .unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn invalid_total_is_invalid_argument() {
        let status = server()
            .create_order(RpcRequest::new(CreateOrderRequest {
                user_id: 1,
                total: 0.0,
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), RpcCode::InvalidArgument);
        assert_eq!(status.message(), "total must be greater than 0");
    }

    #[tokio::test]
    async fn missing_order_is_not_found() {
        let status = server()
            .get_order(RpcRequest::new(GetOrderRequest { id: 999 }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), RpcCode::NotFound);
    }
}
