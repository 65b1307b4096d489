//! Campaign Routes
//!
//! - GET /api/v1/campaigns - List campaigns (`?status=active|draft|archived`)
//! - POST /api/v1/campaigns - Create a campaign
//! - PUT /api/v1/campaigns/:id/status - Change a campaign's status

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use super::carts::parse_id;
use crate::api::dto::{
    CampaignListQuery, CampaignListResponse, CampaignResponse, UpdateCampaignStatusRequest,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::store::{CampaignStatus, NewRecoveryCampaign, RecoveryCampaign};

/// GET /api/v1/campaigns
pub async fn list_campaigns(
    State(state): State<Arc<AppState>>,
    query: Result<Query<CampaignListQuery>, QueryRejection>,
) -> ApiResult<Json<CampaignListResponse>> {
    let Query(query) = query?;
    let status = query
        .status
        .as_deref()
        .map(str::parse::<CampaignStatus>)
        .transpose()
        .map_err(ApiError::Validation)?;

    let now = Utc::now();
    let campaigns: Vec<CampaignResponse> = state
        .campaigns
        .get_campaigns(status)
        .await?
        .into_iter()
        .map(|campaign| CampaignResponse::new(campaign, now))
        .collect();

    Ok(Json(CampaignListResponse {
        total: campaigns.len(),
        campaigns,
    }))
}

/// POST /api/v1/campaigns
pub async fn create_campaign(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewRecoveryCampaign>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RecoveryCampaign>)> {
    let Json(campaign) = payload?;
    let campaign = state.campaigns.create_campaign(campaign).await?;
    Ok((StatusCode::CREATED, Json(campaign)))
}

/// PUT /api/v1/campaigns/:id/status
pub async fn update_campaign_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateCampaignStatusRequest>, JsonRejection>,
) -> ApiResult<Json<RecoveryCampaign>> {
    let id = parse_id(&id)?;
    let Json(req) = payload?;
    let campaign = state.campaigns.update_campaign_status(id, req.status).await?;
    Ok(Json(campaign))
}
