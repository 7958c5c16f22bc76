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
    entities::{support_ticket::TicketStatus, task::TaskPriority},
    errors::ServiceError,
    services::tickets::CreateTicketInput,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct TicketListParams {
    pub status: Option<TicketStatus>,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub per_page: Option<u64>,
}

impl TicketListParams {
    fn pagination(&self) -> PaginationParams {
        let defaults = PaginationParams::default();
        PaginationParams {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusPayload {
    pub status: TicketStatus,
}

#[derive(Debug, Deserialize)]
pub struct PriorityPayload {
    pub priority: TaskPriority,
}

async fn create_ticket(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(input): Json<CreateTicketInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let ticket = state.tickets.create_ticket(input).await?;
    Ok(created_response(ticket))
}

async fn list_tickets(
    State(state): State<AppState>,
    Query(params): Query<TicketListParams>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let page = params.pagination();
    let tickets = state
        .tickets
        .list_tickets(params.status, page.limit(), page.offset())
        .await?;
    Ok(Json(tickets))
}

async fn get_ticket(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let ticket = state.tickets.get_ticket(id).await?;
    Ok(Json(ticket))
}

async fn update_ticket_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
    Json(payload): Json<StatusPayload>,
) -> Result<impl IntoResponse, ServiceError> {
    let ticket = state.tickets.update_status(id, payload.status).await?;
    Ok(Json(ticket))
}

async fn update_ticket_priority(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
    Json(payload): Json<PriorityPayload>,
) -> Result<impl IntoResponse, ServiceError> {
    let ticket = state.tickets.update_priority(id, payload.priority).await?;
    Ok(Json(ticket))
}

pub fn ticket_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_ticket).get(list_tickets))
        .route("/:id", get(get_ticket))
        .route("/:id/status", post(update_ticket_status))
        .route("/:id/priority", post(update_ticket_priority))
}
