use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{RpcStatus, UserId};
use rpc::service::{USERS_CREATE_USER, USERS_GET_USER};
use rpc::{CreateUserRequest, GetUserRequest, RpcRequest, ServerInterceptor, UserReply, UserRpc};

use super::{CreateUserInput, UserService};

/// Exposes [`UserService`] over RPC.
#[derive(Clone)]
pub struct UserRpcServer {
    service: Arc<UserService>,
    interceptor: ServerInterceptor,
}

impl UserRpcServer {
    pub fn new(service: Arc<UserService>, timeout: Duration) -> Self {
        Self {
            service,
            interceptor: ServerInterceptor::new(timeout),
        }
    }
}

#[async_trait]
impl UserRpc for UserRpcServer {
    async fn get_user(&self, request: RpcRequest<GetUserRequest>) -> Result<UserReply, RpcStatus> {
        self.interceptor
            .serve_unary(USERS_GET_USER, request, |ctx, req| async move {
                let user = self.service.get_user(&ctx, UserId::new(req.id)).await?;
                Ok(UserReply::from(&user))
            })
            .await
    }

    async fn create_user(
        &self,
        request: RpcRequest<CreateUserRequest>,
    ) -> Result<UserReply, RpcStatus> {
        self.interceptor
            .serve_unary(USERS_CREATE_USER, request, |ctx, req| async move {
                let input = CreateUserInput {
                    name: req.name,
                    email: req.email,
                };
                let user = self.service.create_user(&ctx, input).await?;
                Ok(UserReply::from(&user))
            })
            .await
    }
}
