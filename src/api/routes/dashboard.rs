//! Dashboard Routes
//!
//! - GET /api/v1/dashboard - Stat cards, monthly trend, channel series and recent carts
//! - GET /api/v1/progress - Progress towards a goal (`?current=&target=`)

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::analytics::fixtures::channel_recovery;
use crate::analytics::{dashboard_cards, monthly_trend, recent_carts, Progress};
use crate::api::dto::{DashboardResponse, ProgressQuery};
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::store::CartFilter;

/// GET /api/v1/dashboard
///
/// Every view is derived from one snapshot of the carts.
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<DashboardResponse>> {
    let carts = state.carts.get_abandoned_carts(&CartFilter::default()).await?;
    let now = Utc::now();

    Ok(Json(DashboardResponse {
        cards: dashboard_cards(&carts, now),
        trend: monthly_trend(&carts, now, state.config.api.trend_months),
        channels: channel_recovery(),
        recent_carts: recent_carts(&carts, now, state.config.api.recent_carts),
    }))
}

/// GET /api/v1/progress
pub async fn get_progress(
    query: Result<Query<ProgressQuery>, QueryRejection>,
) -> ApiResult<Json<Progress>> {
    let Query(query) = query?;
    Ok(Json(Progress::new(query.current, query.target)))
}
