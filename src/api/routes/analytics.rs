//! Analytics Routes
//!
//! - GET /api/v1/analytics - Windowed cart metrics and chart series (`?period=`)
//! - GET /api/v1/experiments - A/B test results (`?status=running|completed`)

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::analytics::experiments::list_experiments;
use crate::analytics::fixtures::{abandonment_reasons, checkout_funnel, time_spent, visitor_segments};
use crate::analytics::{AnalyticsPeriod, ExperimentStatus};
use crate::api::dto::{AnalyticsQuery, AnalyticsResponse, ExperimentListResponse, ExperimentQuery};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::store::CartFilter;

/// GET /api/v1/analytics
///
/// Defaults to the last 30 days.
pub async fn get_analytics(
    State(state): State<Arc<AppState>>,
    query: Result<Query<AnalyticsQuery>, QueryRejection>,
) -> ApiResult<Json<AnalyticsResponse>> {
    let Query(query) = query?;
    let period = match query.period.as_deref() {
        Some(raw) => raw.parse::<AnalyticsPeriod>().map_err(ApiError::Validation)?,
        None => AnalyticsPeriod::default(),
    };

    let carts = state.carts.get_abandoned_carts(&CartFilter::default()).await?;

    Ok(Json(AnalyticsResponse {
        period: period.as_str().to_string(),
        label: period.label().to_string(),
        metrics: period.metrics(&carts, Utc::now()),
        abandonment_reasons: abandonment_reasons(),
        time_spent: time_spent(),
        funnel: checkout_funnel(),
        segments: visitor_segments(),
    }))
}

/// GET /api/v1/experiments
pub async fn list_experiments_handler(
    query: Result<Query<ExperimentQuery>, QueryRejection>,
) -> ApiResult<Json<ExperimentListResponse>> {
    let Query(query) = query?;
    let status = query
        .status
        .as_deref()
        .map(str::parse::<ExperimentStatus>)
        .transpose()
        .map_err(ApiError::Validation)?;

    let experiments = list_experiments(status);
    Ok(Json(ExperimentListResponse {
        total: experiments.len(),
        experiments,
    }))
}
