use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::{AppError, ErrorKind, RequestContext, UserId};
use rpc::UserRpcClient;
use tokio::sync::RwLock;

/// What the orders service needs to know about a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// Confirms that a user exists in the users service.
///
/// Implementations must fail with `NotFound` when the user is confirmed
/// absent and with `Internal` when existence could not be checked.
#[async_trait]
pub trait UserLookup: Send + Sync {
    async fn get_user(&self, ctx: &RequestContext, id: UserId) -> Result<UserInfo, AppError>;
}

/// Looks users up through the users service RPC client.
#[derive(Clone)]
pub struct RpcUserLookup {
    client: UserRpcClient,
}

impl RpcUserLookup {
    pub fn new(client: UserRpcClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UserLookup for RpcUserLookup {
    async fn get_user(&self, ctx: &RequestContext, id: UserId) -> Result<UserInfo, AppError> {
        let reply = self.client.get_user(ctx, id).await?;
        Ok(UserInfo {
            id: UserId::new(reply.id),
            name: reply.name,
            email: reply.email,
        })
    }
}

#[derive(Default)]
struct LookupState {
    users: HashMap<UserId, UserInfo>,
    failure: Option<(ErrorKind, String)>,
    delay: Option<Duration>,
}

/// Scriptable user lookup for tests and local runs.
#[derive(Clone, Default)]
pub struct InMemoryUserLookup {
    state: Arc<RwLock<LookupState>>,
    calls: Arc<AtomicUsize>,
}

impl InMemoryUserLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `id` resolvable.
    pub async fn insert(&self, id: UserId, name: &str, email: &str) {
        self.state.write().await.users.insert(
            id,
            UserInfo {
                id,
                name: name.to_string(),
                email: email.to_string(),
            },
        );
    }

    /// Fails every subsequent lookup with the given kind.
    pub async fn fail_with(&self, kind: ErrorKind, message: &str) {
        self.state.write().await.failure = Some((kind, message.to_string()));
    }

    /// Delays every subsequent lookup.
    pub async fn set_delay(&self, delay: Duration) {
        self.state.write().await.delay = Some(delay);
    }

    /// Number of lookups attempted so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserLookup for InMemoryUserLookup {
    async fn get_user(&self, _ctx: &RequestContext, id: UserId) -> Result<UserInfo, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = self.state.read().await.delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.state.read().await;
        if let Some((kind, message)) = &state.failure {
            return Err(AppError::new(*kind, message.clone()));
        }
        state
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found("user", id))
    }
}
