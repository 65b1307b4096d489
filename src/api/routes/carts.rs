//! Cart Routes
//!
//! - GET /api/v1/carts - List abandoned carts (`?recovered=&user_email=`)
//! - POST /api/v1/carts - Log an abandoned cart
//! - GET /api/v1/carts/:id - Get one cart
//! - POST /api/v1/carts/:id/recover - Mark a cart as recovered

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::dto::{CartListResponse, CartResponse, CreateCartRequest};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::store::CartFilter;

pub(crate) fn parse_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::Validation(format!("Invalid id: {}", raw)))
}

/// GET /api/v1/carts
pub async fn list_carts(
    State(state): State<Arc<AppState>>,
    filter: Result<Query<CartFilter>, QueryRejection>,
) -> ApiResult<Json<CartListResponse>> {
    let Query(filter) = filter?;
    let carts = state.carts.get_abandoned_carts(&filter).await?;

    Ok(Json(CartListResponse {
        total: carts.len(),
        carts: carts.into_iter().map(CartResponse::from).collect(),
    }))
}

/// GET /api/v1/carts/:id
pub async fn get_cart(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<CartResponse>> {
    let cart = state.carts.get_cart(parse_id(&id)?).await?;
    Ok(Json(cart.into()))
}

/// POST /api/v1/carts
pub async fn create_cart(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateCartRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CartResponse>)> {
    let Json(req) = payload?;
    let cart = state.carts.add_abandoned_cart(req.into()).await?;
    Ok((StatusCode::CREATED, Json(cart.into())))
}

/// POST /api/v1/carts/:id/recover
pub async fn recover_cart(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<CartResponse>> {
    let cart = state.carts.mark_cart_as_recovered(parse_id(&id)?).await?;
    Ok(Json(cart.into()))
}
