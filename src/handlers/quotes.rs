use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use super::common::{created_response, PaginationParams};
use crate::{
    auth::AuthenticatedUser,
    entities::quote::QuoteStatus,
    errors::ServiceError,
    services::quotes::{CreateQuoteInput, UpdateQuoteInput},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct QuoteListParams {
    pub status: Option<QuoteStatus>,
    /// Restrict to outstanding quotes past their validity date
    #[serde(default)]
    pub expired: bool,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub per_page: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct StatusPayload {
    pub status: QuoteStatus,
}

async fn create_quote(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(input): Json<CreateQuoteInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let quote = state.quotes.create_quote(input).await?;
    Ok(created_response(quote))
}

async fn list_quotes(
    State(state): State<AppState>,
    Query(params): Query<QuoteListParams>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let defaults = PaginationParams::default();
    let page = PaginationParams {
        page: params.page.unwrap_or(defaults.page),
        per_page: params.per_page.unwrap_or(defaults.per_page),
    };
    let quotes = state
        .quotes
        .list_quotes(
            params.status,
            params.expired,
            Utc::now().date_naive(),
            page.limit(),
            page.offset(),
        )
        .await?;
    Ok(Json(quotes))
}

async fn get_quote(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let quote = state.quotes.get_quote(id).await?;
    Ok(Json(quote))
}

async fn update_quote(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
    Json(input): Json<UpdateQuoteInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let quote = state.quotes.update_quote(id, input).await?;
    Ok(Json(quote))
}

async fn update_quote_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
    Json(payload): Json<StatusPayload>,
) -> Result<impl IntoResponse, ServiceError> {
    let quote = state.quotes.update_status(id, payload.status).await?;
    Ok(Json(quote))
}

pub fn quote_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_quote).get(list_quotes))
        .route("/:id", get(get_quote).put(update_quote))
        .route("/:id/status", post(update_quote_status))
}
