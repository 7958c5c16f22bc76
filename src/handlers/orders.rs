use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use super::common::{created_response, Paginated, PaginationParams};
use crate::{
    auth::AuthenticatedUser,
    entities::order::OrderStatus,
    errors::ServiceError,
    services::orders::CreateOrderInput,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct StatusPayload {
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
}

async fn create_order(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(input): Json<CreateOrderInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.orders.create_order(input).await?;
    Ok(created_response(order))
}

async fn list_orders(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let items = state
        .orders
        .list_orders(params.limit(), params.offset())
        .await?;
    let total = state.orders.count_orders().await?;
    Ok(Json(Paginated {
        items,
        total,
        page: params.page,
        per_page: params.limit(),
    }))
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.orders.get_order(id).await?;
    Ok(Json(order))
}

async fn get_order_items(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let items = state.orders.get_order_items(id).await?;
    Ok(Json(items))
}

/// Marks the order paid; loyalty points accrue here.
async fn pay_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.orders.mark_paid(id).await?;
    Ok(Json(order))
}

async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
    Json(payload): Json<StatusPayload>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state
        .orders
        .update_status(id, payload.status, payload.tracking_number)
        .await?;
    Ok(Json(order))
}

async fn cancel_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.orders.cancel_order(id).await?;
    Ok(Json(order))
}

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/:id", get(get_order))
        .route("/:id/items", get(get_order_items))
        .route("/:id/pay", post(pay_order))
        .route("/:id/status", post(update_order_status))
        .route("/:id/cancel", post(cancel_order))
}
