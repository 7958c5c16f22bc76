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
    errors::ServiceError,
    services::products::{CreateProductInput, UpdateProductInput},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct StockAdjustment {
    pub delta: i32,
}

async fn create_product(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(input): Json<CreateProductInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.products.create_product(input).await?;
    Ok(created_response(product))
}

async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let items = state
        .products
        .list_products(params.limit(), params.offset())
        .await?;
    let total = state.products.count_products().await?;
    Ok(Json(Paginated {
        items,
        total,
        page: params.page,
        per_page: params.limit(),
    }))
}

async fn list_low_stock(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let products = state.products.list_low_stock().await?;
    Ok(Json(products))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.products.get_product(id).await?;
    Ok(Json(product))
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
    Json(input): Json<UpdateProductInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.products.update_product(id, input).await?;
    Ok(Json(product))
}

async fn adjust_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
    Json(payload): Json<StockAdjustment>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.products.adjust_stock(id, payload.delta).await?;
    Ok(Json(product))
}

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route("/low-stock", get(list_low_stock))
        .route("/:id", get(get_product).put(update_product))
        .route("/:id/stock", post(adjust_stock))
}
