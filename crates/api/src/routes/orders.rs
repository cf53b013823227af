//! Order endpoints, forwarded to the orders service.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use common::{OrderId, RequestContext, UserId};
use rpc::{OrderReply, OrderRpcClient};
use serde::Deserialize;

use super::{DataResponse, parse_id};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct CreateOrderBody {
    pub user_id: u64,
    pub total: f64,
}

/// POST /api/v1/orders
pub async fn create(
    State(orders): State<OrderRpcClient>,
    Extension(ctx): Extension<RequestContext>,
    body: Result<Json<CreateOrderBody>, JsonRejection>,
) -> Result<(StatusCode, Json<DataResponse<OrderReply>>), ApiError> {
    let Json(body) = body.map_err(|rejection| ApiError::invalid_body(&ctx, rejection))?;
    let order = orders
        .create_order(&ctx, UserId::new(body.user_id), body.total)
        .await
        .map_err(|e| ApiError::new(&ctx, e))?;
    Ok((StatusCode::CREATED, DataResponse::new(&ctx, order)))
}

/// GET /api/v1/orders/{id}
pub async fn get(
    State(orders): State<OrderRpcClient>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<OrderReply>>, ApiError> {
    let id = parse_id(&ctx, &id, "order")?;
    let order = orders
        .get_order(&ctx, OrderId::new(id))
        .await
        .map_err(|e| ApiError::new(&ctx, e))?;
    Ok(DataResponse::new(&ctx, order))
}
