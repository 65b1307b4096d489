//! Discount Strategy Routes
//!
//! - GET /api/v1/discounts - List strategies
//! - GET /api/v1/discounts/suggestion - Suggest a strategy from live cart metrics
//! - POST /api/v1/discounts/suggestion/apply - Save the suggestion as a draft
//! - GET /api/v1/discounts/:id - Get one strategy
//! - POST /api/v1/discounts/:id/activate - Activate a strategy
//! - POST /api/v1/discounts/:id/pause - Pause a strategy

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::analytics::discounts::suggest;
use crate::analytics::{CartMetrics, DiscountSuggestion, StrategyCard};
use crate::api::dto::StrategyListResponse;
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::store::CartFilter;

fn strategy_not_found(id: &str) -> ApiError {
    ApiError::NotFound(format!("Discount strategy {} not found", id))
}

async fn current_suggestion(state: &AppState) -> ApiResult<DiscountSuggestion> {
    let carts = state.carts.get_abandoned_carts(&CartFilter::default()).await?;
    Ok(suggest(&CartMetrics::from_carts(&carts)))
}

/// GET /api/v1/discounts
pub async fn list_strategies(State(state): State<Arc<AppState>>) -> Json<StrategyListResponse> {
    let strategies = state.discounts.list().await;
    Json(StrategyListResponse {
        total: strategies.len(),
        strategies,
    })
}

/// GET /api/v1/discounts/:id
pub async fn get_strategy(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<StrategyCard>> {
    state
        .discounts
        .get(&id)
        .await
        .map(Json)
        .ok_or_else(|| strategy_not_found(&id))
}

/// POST /api/v1/discounts/:id/activate
pub async fn activate_strategy(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<StrategyCard>> {
    state
        .discounts
        .activate(&id)
        .await
        .map(Json)
        .ok_or_else(|| strategy_not_found(&id))
}

/// POST /api/v1/discounts/:id/pause
pub async fn pause_strategy(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<StrategyCard>> {
    state
        .discounts
        .pause(&id)
        .await
        .map(Json)
        .ok_or_else(|| strategy_not_found(&id))
}

/// GET /api/v1/discounts/suggestion
pub async fn get_suggestion(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<DiscountSuggestion>> {
    Ok(Json(current_suggestion(&state).await?))
}

/// POST /api/v1/discounts/suggestion/apply
pub async fn apply_suggestion(
    State(state): State<Arc<AppState>>,
) -> ApiResult<(StatusCode, Json<StrategyCard>)> {
    let suggestion = current_suggestion(&state).await?;
    let card = state.discounts.apply_suggestion(&suggestion).await;
    Ok((StatusCode::CREATED, Json(card)))
}
