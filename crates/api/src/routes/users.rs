//! User endpoints, forwarded to the users service.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use common::{RequestContext, UserId};
use rpc::{UserReply, UserRpcClient};
use serde::Deserialize;

use super::{DataResponse, parse_id};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct CreateUserBody {
    pub name: String,
    pub email: String,
}

/// POST /api/v1/users
pub async fn create(
    State(users): State<UserRpcClient>,
    Extension(ctx): Extension<RequestContext>,
    body: Result<Json<CreateUserBody>, JsonRejection>,
) -> Result<(StatusCode, Json<DataResponse<UserReply>>), ApiError> {
    let Json(body) = body.map_err(|rejection| ApiError::invalid_body(&ctx, rejection))?;
    let user = users
        .create_user(&ctx, body.name, body.email)
        .await
        .map_err(|e| ApiError::new(&ctx, e))?;
    Ok((StatusCode::CREATED, DataResponse::new(&ctx, user)))
}

/// GET /api/v1/users/{id}
pub async fn get(
    State(users): State<UserRpcClient>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<UserReply>>, ApiError> {
    let id = parse_id(&ctx, &id, "user")?;
    let user = users
        .get_user(&ctx, UserId::new(id))
        .await
        .map_err(|e| ApiError::new(&ctx, e))?;
    Ok(DataResponse::new(&ctx, user))
}
