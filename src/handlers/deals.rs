use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::common::{created_response, PaginationParams};
use crate::{
    auth::AuthenticatedUser,
    entities::deal::DealStage,
    errors::ServiceError,
    services::deals::CreateDealInput,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct DealListParams {
    pub stage: Option<DealStage>,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub per_page: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct StagePayload {
    pub stage: DealStage,
}

async fn create_deal(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(input): Json<CreateDealInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let deal = state.deals.create_deal(input).await?;
    Ok(created_response(deal))
}

async fn list_deals(
    State(state): State<AppState>,
    Query(params): Query<DealListParams>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let defaults = PaginationParams::default();
    let page = PaginationParams {
        page: params.page.unwrap_or(defaults.page),
        per_page: params.per_page.unwrap_or(defaults.per_page),
    };
    let deals = state
        .deals
        .list_deals(params.stage, page.limit(), page.offset())
        .await?;
    Ok(Json(deals))
}

async fn get_deal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let deal = state.deals.get_deal(id).await?;
    Ok(Json(deal))
}

async fn get_deal_quotes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    state.deals.get_deal(id).await?;
    let quotes = state.quotes.list_deal_quotes(id).await?;
    Ok(Json(quotes))
}

async fn update_deal_stage(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
    Json(payload): Json<StagePayload>,
) -> Result<impl IntoResponse, ServiceError> {
    let deal = state.deals.update_stage(id, payload.stage).await?;
    Ok(Json(deal))
}

/// Probability-weighted value of all open deals.
async fn pipeline_value(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let value = state.deals.pipeline_value().await?;
    Ok(Json(json!({ "pipeline_value": value })))
}

pub fn deal_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_deal).get(list_deals))
        .route("/pipeline", get(pipeline_value))
        .route("/:id", get(get_deal))
        .route("/:id/quotes", get(get_deal_quotes))
        .route("/:id/stage", post(update_deal_stage))
}
