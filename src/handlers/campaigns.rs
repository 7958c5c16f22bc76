use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use super::common::{created_response, PaginationParams};
use crate::{
    auth::AuthenticatedUser,
    errors::ServiceError,
    services::campaigns::{CreateCampaignInput, EngagementKind},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct EngagementPayload {
    pub kind: EngagementKind,
}

async fn create_campaign(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(input): Json<CreateCampaignInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let campaign = state.campaigns.create_campaign(input).await?;
    Ok(created_response(campaign))
}

async fn list_campaigns(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let campaigns = state
        .campaigns
        .list_campaigns(params.limit(), params.offset())
        .await?;
    Ok(Json(campaigns))
}

async fn get_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let campaign = state.campaigns.get_campaign(id).await?;
    Ok(Json(campaign))
}

/// Dispatches the campaign to every opted-in customer.
async fn send_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let campaign = state.campaigns.send_campaign(id).await?;
    Ok(Json(campaign))
}

async fn record_engagement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
    Json(payload): Json<EngagementPayload>,
) -> Result<impl IntoResponse, ServiceError> {
    let campaign = state.campaigns.record_engagement(id, payload.kind).await?;
    Ok(Json(campaign))
}

async fn cancel_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let campaign = state.campaigns.cancel_campaign(id).await?;
    Ok(Json(campaign))
}

pub fn campaign_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_campaign).get(list_campaigns))
        .route("/:id", get(get_campaign))
        .route("/:id/send", post(send_campaign))
        .route("/:id/engagement", post(record_engagement))
        .route("/:id/cancel", post(cancel_campaign))
}
