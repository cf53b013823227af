use std::future::Future;
use std::sync::Arc;

use common::{AppError, ErrorKind, RequestContext, UserId};
use domain::{ROUTING_KEY_USER_CREATED, User, UserError};
use record_store::UserRepository;

use crate::publisher::spawn_publish;
use crate::{Timeouts, UserEventPublisher};

/// Caller-supplied fields of a new user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
}

/// User registration and lookup.
pub struct UserService {
    repo: Arc<dyn UserRepository>,
    publisher: Option<Arc<dyn UserEventPublisher>>,
    timeouts: Timeouts,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self {
            repo,
            publisher: None,
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn UserEventPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Registers a user with a unique email address.
    #[tracing::instrument(skip(self, ctx), fields(trace_id = %ctx.trace_id()))]
    pub async fn create_user(
        &self,
        ctx: &RequestContext,
        input: CreateUserInput,
    ) -> Result<User, AppError> {
        let mut user = User::new(input.name, input.email)?;

        match self.storage(ctx, self.repo.get_by_email(&user.email)).await {
            Ok(_) => return Err(UserError::EmailExists.into()),
            Err(err) if err.is(ErrorKind::NotFound) => {}
            Err(err) => {
                return Err(AppError::internal("failed to check email existence").with_source(err));
            }
        }

        // The store still rejects a concurrent insert of the same address.
        self.storage(ctx, self.repo.create(&mut user))
            .await
            .map_err(|err| {
                if err.is(ErrorKind::Conflict) {
                    err
                } else {
                    AppError::internal("failed to create user").with_source(err)
                }
            })?;

        if let Some(publisher) = &self.publisher {
            let publisher = Arc::clone(publisher);
            let publish_ctx = ctx.detached();
            let created = user.clone();
            spawn_publish(ROUTING_KEY_USER_CREATED, self.timeouts.publish, async move {
                publisher.publish_user_created(&publish_ctx, &created).await
            });
        }

        metrics::counter!("users_created_total").increment(1);
        tracing::info!(user_id = %user.id, email = %user.email, "user created");
        Ok(user)
    }

    /// Fetches a user by id.
    #[tracing::instrument(skip(self, ctx), fields(trace_id = %ctx.trace_id()))]
    pub async fn get_user(&self, ctx: &RequestContext, id: UserId) -> Result<User, AppError> {
        self.storage(ctx, self.repo.get_by_id(id)).await
    }

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
