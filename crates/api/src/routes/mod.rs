//! HTTP route handlers.

pub mod health;
pub mod metrics;
pub mod orders;
pub mod users;

use axum::Json;
use axum::extract::FromRef;
use common::{AppError, RequestContext};
use rpc::{OrderRpcClient, UserRpcClient};
use serde::Serialize;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
#[derive(Clone)]
pub struct AppState {
    pub users: UserRpcClient,
    pub orders: OrderRpcClient,
}

impl FromRef<AppState> for UserRpcClient {
    fn from_ref(state: &AppState) -> Self {
        state.users.clone()
    }
}

impl FromRef<AppState> for OrderRpcClient {
    fn from_ref(state: &AppState) -> Self {
        state.orders.clone()
    }
}

/// Success envelope: `{"data": ..., "trace_id": "..."}`.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
    pub trace_id: String,
}

impl<T> DataResponse<T> {
    pub fn new(ctx: &RequestContext, data: T) -> Json<Self> {
        Json(Self {
            data,
            trace_id: ctx.trace_id().to_string(),
        })
    }
}

/// Parses a positive numeric path id.
pub(crate) fn parse_id(ctx: &RequestContext, raw: &str, what: &str) -> Result<u64, ApiError> {
    match raw.parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::new(
            ctx,
            AppError::validation(format!("invalid {what} id")),
        )),
    }
}
