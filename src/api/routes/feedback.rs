//! Feedback Routes
//!
//! - GET /api/v1/feedback - List feedback (`?sentiment=&search=&order=newest|oldest`)
//! - GET /api/v1/feedback/distribution - Sentiment distribution
//! - POST /api/v1/feedback - Add feedback

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::analytics::sentiment::{Feedback, FeedbackView};
use crate::analytics::{FeedbackQuery, SentimentDistribution};
use crate::api::dto::CreateFeedbackRequest;
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

/// GET /api/v1/feedback
pub async fn list_feedback(
    State(state): State<Arc<AppState>>,
    query: Result<Query<FeedbackQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<FeedbackView>>> {
    let Query(query) = query?;
    Ok(Json(state.feedback.list(&query, Utc::now()).await))
}

/// GET /api/v1/feedback/distribution
pub async fn get_distribution(State(state): State<Arc<AppState>>) -> Json<SentimentDistribution> {
    Json(state.feedback.distribution().await)
}

/// POST /api/v1/feedback
pub async fn add_feedback(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateFeedbackRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Feedback>)> {
    let Json(req) = payload?;
    if req.content.trim().is_empty() {
        return Err(ApiError::Validation("Feedback content is required".to_string()));
    }
    if req.customer.trim().is_empty() {
        return Err(ApiError::Validation("Customer name is required".to_string()));
    }

    let feedback = state.feedback.add(req.content, req.customer).await;
    Ok((StatusCode::CREATED, Json(feedback)))
}
