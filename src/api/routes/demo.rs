//! Demo Data Routes
//!
//! - POST /api/v1/demo/carts - Generate random abandoned carts (`{"count": n}`, default 10)
//! - POST /api/v1/demo/campaigns - Insert the stock recovery campaigns

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{CartResponse, DemoCartsRequest, DemoResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::store::RecoveryCampaign;

/// POST /api/v1/demo/carts
///
/// An empty body uses the default count.
pub async fn generate_carts(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<DemoResponse<CartResponse>>)> {
    let req = if body.is_empty() {
        DemoCartsRequest::default()
    } else {
        serde_json::from_slice::<DemoCartsRequest>(&body)
            .map_err(|e| ApiError::Validation(format!("Invalid request body: {}", e)))?
    };

    let carts = state.carts.generate_demo_carts(req.count).await?;
    let carts = carts.into_iter().map(CartResponse::from).collect();
    Ok((StatusCode::CREATED, Json(DemoResponse::new(carts))))
}

/// POST /api/v1/demo/campaigns
pub async fn generate_campaigns(
    State(state): State<Arc<AppState>>,
) -> ApiResult<(StatusCode, Json<DemoResponse<RecoveryCampaign>>)> {
    let campaigns = state.campaigns.generate_demo_campaigns().await?;
    Ok((StatusCode::CREATED, Json(DemoResponse::new(campaigns))))
}
