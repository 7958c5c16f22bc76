use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::common::{created_response, no_content_response, Paginated, PaginationParams};
use crate::{
    auth::AuthenticatedUser,
    errors::ServiceError,
    services::customers::{CreateCustomerInput, UpdateCustomerInput},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RedeemPayload {
    #[validate(range(min = 1))]
    pub points: i32,
    pub description: Option<String>,
}

async fn create_customer(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(input): Json<CreateCustomerInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let customer = state.customers.create_customer(input).await?;
    Ok(created_response(customer))
}

async fn list_customers(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let items = state
        .customers
        .list_customers(params.limit(), params.offset())
        .await?;
    let total = state.customers.count_customers().await?;
    Ok(Json(Paginated {
        items,
        total,
        page: params.page,
        per_page: params.limit(),
    }))
}

async fn search_customers(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let customers = state.customers.search_customers(&params.q).await?;
    Ok(Json(customers))
}

async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let customer = state.customers.get_customer(id).await?;
    Ok(Json(customer))
}

async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
    Json(input): Json<UpdateCustomerInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let customer = state.customers.update_customer(id, input).await?;
    Ok(Json(customer))
}

async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    state.customers.delete_customer(id).await?;
    Ok(no_content_response())
}

async fn get_customer_orders(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    state.customers.get_customer(id).await?;
    let orders = state.orders.list_customer_orders(id).await?;
    Ok(Json(orders))
}

async fn get_customer_deals(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    state.customers.get_customer(id).await?;
    let deals = state.deals.list_customer_deals(id).await?;
    Ok(Json(deals))
}

async fn get_customer_quotes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    state.customers.get_customer(id).await?;
    let quotes = state.quotes.list_customer_quotes(id).await?;
    Ok(Json(quotes))
}

async fn get_customer_interactions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    state.customers.get_customer(id).await?;
    let interactions = state
        .interactions
        .list_customer_interactions(id, params.limit(), params.offset())
        .await?;
    Ok(Json(interactions))
}

async fn get_customer_tickets(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    state.customers.get_customer(id).await?;
    let tickets = state.tickets.list_customer_tickets(id).await?;
    Ok(Json(tickets))
}

async fn get_customer_feedback(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    state.customers.get_customer(id).await?;
    let feedback = state.feedback.list_customer_feedback(id).await?;
    Ok(Json(feedback))
}

async fn get_communication_preferences(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let prefs = state.customers.get_communication_preferences(id).await?;
    Ok(Json(prefs))
}

/// Stored RFM scores; 404 until the first calculation has run.
async fn get_rfm(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let rfm = state
        .scoring
        .get_rfm(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("No RFM scores for customer {}", id)))?;
    Ok(Json(rfm))
}

/// Recalculates RFM scores from order history and returns the fresh row.
async fn calculate_rfm(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let rfm = state.scoring.calculate_rfm(id, Utc::now()).await?;
    Ok(Json(rfm))
}

async fn get_analytics(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let analytics = state
        .scoring
        .get_analytics(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("No analytics for customer {}", id)))?;
    Ok(Json(analytics))
}

async fn calculate_analytics(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let analytics = state.scoring.calculate_analytics(id, Utc::now()).await?;
    Ok(Json(analytics))
}

async fn get_loyalty_account(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    state.customers.get_customer(id).await?;
    let account = state.loyalty.get_account(id).await?;
    Ok(Json(account))
}

async fn get_loyalty_transactions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    state.customers.get_customer(id).await?;
    let transactions = state.loyalty.list_transactions(id).await?;
    Ok(Json(transactions))
}

async fn redeem_points(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
    Json(payload): Json<RedeemPayload>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let description = payload
        .description
        .unwrap_or_else(|| "Points redemption".to_string());
    let account = state
        .loyalty
        .redeem(id, payload.points, description)
        .await?;
    Ok(Json(account))
}

pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_customer).get(list_customers))
        .route("/search", get(search_customers))
        .route(
            "/:id",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route("/:id/orders", get(get_customer_orders))
        .route("/:id/deals", get(get_customer_deals))
        .route("/:id/quotes", get(get_customer_quotes))
        .route("/:id/interactions", get(get_customer_interactions))
        .route("/:id/tickets", get(get_customer_tickets))
        .route("/:id/feedback", get(get_customer_feedback))
        .route("/:id/preferences", get(get_communication_preferences))
        .route("/:id/rfm", get(get_rfm).post(calculate_rfm))
        .route("/:id/analytics", get(get_analytics).post(calculate_analytics))
        .route("/:id/loyalty", get(get_loyalty_account))
        .route("/:id/loyalty/transactions", get(get_loyalty_transactions))
        .route("/:id/loyalty/redeem", post(redeem_points))
}
