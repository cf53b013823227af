use std::future::Future;
use std::sync::Arc;

use common::{AppError, ErrorKind, OrderId, RequestContext, UserId};
use domain::{Order, OrderError, ROUTING_KEY_ORDER_CREATED};
use record_store::OrderRepository;

use super::UserLookup;
use crate::publisher::spawn_publish;
use crate::{OrderEventPublisher, Timeouts};

/// Caller-supplied fields of a new order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreateOrderInput {
    pub user_id: UserId,
    pub total: f64,
}

/// Order creation workflow and order queries.
///
/// The user lookup and the publisher are optional: without a lookup the
/// referenced user is not checked, without a publisher no event is emitted.
/// The service keeps no state of its own and is shared by all requests.
pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
    users: Option<Arc<dyn UserLookup>>,
    publisher: Option<Arc<dyn OrderEventPublisher>>,
    timeouts: Timeouts,
}

impl OrderService {
    /// Creates a service with no user lookup and no publisher.
    pub fn new(repo: Arc<dyn OrderRepository>) -> Self {
        Self {
            repo,
            users: None,
            publisher: None,
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_user_lookup(mut self, users: Arc<dyn UserLookup>) -> Self {
        self.users = Some(users);
        self
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn OrderEventPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Creates an order for an existing user.
    ///
    /// Steps run in order: remote user check, validation, persistence, then
    /// a best-effort `order.created` event. Once the order is stored the call
    /// succeeds regardless of the event's fate; the event is published in the
    /// background.
    #[tracing::instrument(skip(self, ctx), fields(trace_id = %ctx.trace_id()))]
    pub async fn create_order(
        &self,
        ctx: &RequestContext,
        input: CreateOrderInput,
    ) -> Result<Order, AppError> {
        let result = self.try_create_order(ctx, input).await;
        match &result {
            Ok(order) => {
                metrics::counter!("orders_created_total").increment(1);
                tracing::info!(
                    order_id = %order.id,
                    user_id = %order.user_id,
                    total = order.total,
                    "order created"
                );
            }
            Err(err) => {
                metrics::counter!("orders_create_failed_total", "kind" => err.kind().code())
                    .increment(1);
            }
        }
        result
    }

    async fn try_create_order(
        &self,
        ctx: &RequestContext,
        input: CreateOrderInput,
    ) -> Result<Order, AppError> {
        if let Some(users) = &self.users {
            self.check_user(ctx, users.as_ref(), input.user_id).await?;
        }

        let mut order = Order::new(input.user_id, input.total)?;

        self.storage(ctx, self.repo.create(&mut order))
            .await
            .map_err(|e| AppError::internal("failed to create order").with_source(e))?;

        if let Some(publisher) = &self.publisher {
            self.publish_created(ctx, publisher, &order);
        }

        Ok(order)
    }

    async fn check_user(
        &self,
        ctx: &RequestContext,
        users: &dyn UserLookup,
        user_id: UserId,
    ) -> Result<(), AppError> {
        let lookup = ctx.run(self.timeouts.lookup, users.get_user(ctx, user_id)).await;
        match lookup {
            Ok(Ok(user)) => {
                tracing::debug!(user_id = %user.id, "user validated");
                Ok(())
            }
            Ok(Err(err)) if err.is(ErrorKind::NotFound) => {
                Err(OrderError::UserNotFound { user_id }.into())
            }
            Ok(Err(err)) => Err(AppError::internal("failed to validate user").with_source(err)),
            Err(elapsed) => Err(AppError::internal("failed to validate user").with_source(elapsed)),
        }
    }

    /// Hands the event to a background task. The request does not wait for
    /// it and its deadline does not apply.
    fn publish_created(
        &self,
        ctx: &RequestContext,
        publisher: &Arc<dyn OrderEventPublisher>,
        order: &Order,
    ) {
        let publisher = Arc::clone(publisher);
        let publish_ctx = ctx.detached();
        let order = order.clone();
        spawn_publish(ROUTING_KEY_ORDER_CREATED, self.timeouts.publish, async move {
            publisher.publish_order_created(&publish_ctx, &order).await
        });
    }

    /// Fetches an order by id.
    #[tracing::instrument(skip(self, ctx), fields(trace_id = %ctx.trace_id()))]
    pub async fn get_order(&self, ctx: &RequestContext, id: OrderId) -> Result<Order, AppError> {
        self.storage(ctx, self.repo.get_by_id(id)).await
    }

    /// Lists the orders of a user, oldest first.
    #[tracing::instrument(skip(self, ctx), fields(trace_id = %ctx.trace_id()))]
    pub async fn get_orders_by_user(
        &self,
        ctx: &RequestContext,
        user_id: UserId,
    ) -> Result<Vec<Order>, AppError> {
        self.storage(ctx, self.repo.get_by_user_id(user_id)).await
    }

    /// Moves a pending order to `confirmed`.
    #[tracing::instrument(skip(self, ctx), fields(trace_id = %ctx.trace_id()))]
    pub async fn confirm_order(&self, ctx: &RequestContext, id: OrderId) -> Result<Order, AppError> {
        self.transition(ctx, id, Order::confirm).await
    }

    /// Moves a pending order to `cancelled`.
    #[tracing::instrument(skip(self, ctx), fields(trace_id = %ctx.trace_id()))]
    pub async fn cancel_order(&self, ctx: &RequestContext, id: OrderId) -> Result<Order, AppError> {
        self.transition(ctx, id, Order::cancel).await
    }

    async fn transition(
        &self,
        ctx: &RequestContext,
        id: OrderId,
        apply: fn(&mut Order) -> Result<(), OrderError>,
    ) -> Result<Order, AppError> {
        let mut order = self.storage(ctx, self.repo.get_by_id(id)).await?;
        apply(&mut order)?;
        self.storage(ctx, self.repo.update(&mut order)).await?;
        tracing::info!(order_id = %order.id, status = %order.status, "order status changed");
        Ok(order)
    }

    /// Bounds a record store call by the storage timeout and the request
    /// deadline. Running out of time is `Internal`.
    async fn storage<T, F>(&self, ctx: &RequestContext, call: F) -> Result<T, AppError>
    where
        F: Future<Output = record_store::Result<T>>,
    {
        ctx.run(self.timeouts.storage, call)
            .await
            .map_err(|elapsed| AppError::internal("storage call timed out").with_source(elapsed))?
            .map_err(AppError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::TraceId;
    use domain::OrderStatus;
    use record_store::InMemoryOrderRepository;

    use crate::InMemoryUserLookup;

    fn ctx() -> RequestContext {
        RequestContext::new(TraceId::from("trace-test"))
    }

    fn input(user_id: u64, total: f64) -> CreateOrderInput {
        CreateOrderInput {
            user_id: UserId::new(user_id),
            total,
        }
    }

    #[tokio::test]
    async fn degraded_mode_skips_user_check() {
        let repo = Arc::new(InMemoryOrderRepository::new());
        let service = OrderService::new(repo.clone());

        let order = service.create_order(&ctx(), input(42, 10.0)).await.unwrap();
        assert_eq!(order.id, OrderId::new(1));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(repo.count().await, 1);
    }

    #[tokio::test]
    async fn lookup_runs_before_validation() {
        let lookup = InMemoryUserLookup::new();
        let service = OrderService::new(Arc::new(InMemoryOrderRepository::new()))
            .with_user_lookup(Arc::new(lookup.clone()));

        let err = service
            .create_order(&ctx(), input(999, -10.0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.details().unwrap()["user_id"], 999);
        assert_eq!(lookup.calls(), 1);
    }

    #[tokio::test]
    async fn confirm_then_cancel_is_a_conflict() {
        let service = OrderService::new(Arc::new(InMemoryOrderRepository::new()));
        let order = service.create_order(&ctx(), input(1, 25.0)).await.unwrap();

        let confirmed = service.confirm_order(&ctx(), order.id).await.unwrap();
        assert_eq!(confirmed.status, OrderStatus::Confirmed);
        assert_eq!(
            service.get_order(&ctx(), order.id).await.unwrap().status,
            OrderStatus::Confirmed
        );

        let err = service.cancel_order(&ctx(), order.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn cancel_missing_order_is_not_found() {
        let service = OrderService::new(Arc::new(InMemoryOrderRepository::new()));
        let err = service
            .cancel_order(&ctx(), OrderId::new(5))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn orders_by_user() {
        let service = OrderService::new(Arc::new(InMemoryOrderRepository::new()));
        for (user, total) in [(1, 5.0), (2, 6.0), (1, 7.0)] {
            service.create_order(&ctx(), input(user, total)).await.unwrap();
        }

        let orders = service
            .get_orders_by_user(&ctx(), UserId::new(1))
            .await
            .unwrap();
        let totals: Vec<f64> = orders.iter().map(|o| o.total).collect();
        assert_eq!(totals, vec![5.0, 7.0]);
        assert!(
            service
                .get_orders_by_user(&ctx(), UserId::new(3))
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn expired_request_stores_nothing() {
        let repo = Arc::new(InMemoryOrderRepository::new());
        let service = OrderService::new(repo.clone());
        let ctx = ctx().with_timeout(std::time::Duration::from_millis(1));
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let err = service.create_order(&ctx, input(1, 10.0)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(repo.count().await, 0);
    }
}
