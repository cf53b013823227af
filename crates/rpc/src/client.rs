use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use common::{AppError, OrderId, RequestContext, RpcStatus, UserId};

use crate::RpcRequest;
use crate::messages::{
    CreateOrderRequest, CreateUserRequest, GetOrderRequest, GetUserRequest, OrderReply, UserReply,
};
use crate::service::{
    ORDERS_CREATE_ORDER, ORDERS_GET_ORDER, OrderRpc, USERS_CREATE_USER, USERS_GET_USER, UserRpc,
};

/// Client side of every unary call.
///
/// Injects the caller's trace id, bounds the call by the client timeout or the
/// caller's remaining deadline (whichever is shorter) and classifies the
/// returned status back into the error taxonomy.
#[derive(Debug, Clone, Copy)]
pub struct ClientInterceptor {
    timeout: Duration,
}

impl ClientInterceptor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub async fn call_unary<Req, Resp, F, Fut>(
        &self,
        ctx: &RequestContext,
        method: &'static str,
        message: Req,
        invoke: F,
    ) -> Result<Resp, AppError>
    where
        F: FnOnce(RpcRequest<Req>) -> Fut,
        Fut: Future<Output = Result<Resp, RpcStatus>>,
    {
        let budget = ctx.budget(self.timeout);
        let request = RpcRequest::new(message)
            .with_trace_id(ctx.trace_id())
            .with_timeout(budget);

        let status = match tokio::time::timeout(budget, invoke(request)).await {
            Ok(Ok(reply)) => return Ok(reply),
            Ok(Err(status)) => status,
            Err(_) => RpcStatus::deadline_exceeded(format!("{method} timed out after {budget:?}")),
        };

        tracing::debug!(method, trace_id = %ctx.trace_id(), rpc_code = %status.code(), "rpc call failed");
        Err(AppError::from(status))
    }
}

/// Typed client for the users service.
#[derive(Clone)]
pub struct UserRpcClient {
    inner: Arc<dyn UserRpc>,
    interceptor: ClientInterceptor,
}

impl UserRpcClient {
    pub fn new(inner: Arc<dyn UserRpc>, timeout: Duration) -> Self {
        Self {
            inner,
            interceptor: ClientInterceptor::new(timeout),
        }
    }

    pub async fn get_user(&self, ctx: &RequestContext, id: UserId) -> Result<UserReply, AppError> {
        self.interceptor
            .call_unary(
                ctx,
                USERS_GET_USER,
                GetUserRequest { id: id.as_u64() },
                |req| self.inner.get_user(req),
            )
            .await
    }

    pub async fn create_user(
        &self,
        ctx: &RequestContext,
        name: String,
        email: String,
    ) -> Result<UserReply, AppError> {
        self.interceptor
            .call_unary(
                ctx,
                USERS_CREATE_USER,
                CreateUserRequest { name, email },
                |req| self.inner.create_user(req),
            )
            .await
    }
}

/// Typed client for the orders service.
#[derive(Clone)]
pub struct OrderRpcClient {
    inner: Arc<dyn OrderRpc>,
    interceptor: ClientInterceptor,
}

impl OrderRpcClient {
    pub fn new(inner: Arc<dyn OrderRpc>, timeout: Duration) -> Self {
        Self {
            inner,
            interceptor: ClientInterceptor::new(timeout),
        }
    }

    pub async fn get_order(
        &self,
        ctx: &RequestContext,
        id: OrderId,
    ) -> Result<OrderReply, AppError> {
        self.interceptor
            .call_unary(
                ctx,
                ORDERS_GET_ORDER,
                GetOrderRequest { id: id.as_u64() },
                |req| self.inner.get_order(req),
            )
            .await
    }

    pub async fn create_order(
        &self,
        ctx: &RequestContext,
        user_id: UserId,
        total: f64,
    ) -> Result<OrderReply, AppError> {
        self.interceptor
            .call_unary(
                ctx,
                ORDERS_CREATE_ORDER,
                CreateOrderRequest {
                    user_id: user_id.as_u64(),
                    total,
                },
                |req| self.inner.create_order(req),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{ErrorKind, RpcCode, TraceId};

    #[tokio::test]
    async fn injects_trace_id_and_budget() {
        let ctx = RequestContext::new(TraceId::from("trace-1"));
        let (trace, timeout) = ClientInterceptor::new(Duration::from_secs(2))
            .call_unary(&ctx, "/test/Echo", (), |req| async move {
                Ok::<_, RpcStatus>((
                    req.metadata.trace_id().map(str::to_string),
                    req.timeout,
                ))
            })
            .await
            .unwrap();
        assert_eq!(trace.as_deref(), Some("trace-1"));
        assert_eq!(timeout, Some(Duration::from_secs(2)));
    }

    #[tokio::test]
    async fn not_found_status_stays_not_found() {
        let err = ClientInterceptor::new(Duration::from_secs(1))
            .call_unary(&RequestContext::generate(), "/test/Get", (), |_| async {
                Err::<(), _>(RpcStatus::new(RpcCode::NotFound, "user with id '9' not found"))
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.message(), "user with id '9' not found");
    }

    #[tokio::test]
    async fn transport_failure_is_internal_with_original_text_in_details() {
        let err = ClientInterceptor::new(Duration::from_secs(1))
            .call_unary(&RequestContext::generate(), "/test/Get", (), |_| async {
                Err::<(), _>(RpcStatus::unavailable("connection refused"))
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        let details = err.details().unwrap();
        assert_eq!(details["rpc_code"], "UNAVAILABLE");
        assert_eq!(details["rpc_message"], "connection refused");
    }

    #[tokio::test(start_paused = true)]
    async fn slow_remote_times_out_as_internal() {
        let err = ClientInterceptor::new(Duration::from_millis(50))
            .call_unary(&RequestContext::generate(), "/test/Slow", (), |_| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok::<(), RpcStatus>(())
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.details().unwrap()["rpc_code"], "DEADLINE_EXCEEDED");
    }

    #[tokio::test(start_paused = true)]
    async fn caller_deadline_caps_client_timeout() {
        let ctx = RequestContext::generate().with_timeout(Duration::from_millis(20));
        let timeout = ClientInterceptor::new(Duration::from_secs(10))
            .call_unary(&ctx, "/test/Echo", (), |req| async move {
                Ok::<_, RpcStatus>(req.timeout)
            })
            .await
            .unwrap();
        assert!(timeout.unwrap() <= Duration::from_millis(20));
    }
}
