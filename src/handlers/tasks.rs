use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use super::common::{created_response, no_content_response, PaginationParams};
use crate::{
    auth::AuthenticatedUser,
    entities::task::TaskStatus,
    errors::ServiceError,
    services::tasks::CreateTaskInput,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct TaskListParams {
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub per_page: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct StatusPayload {
    pub status: TaskStatus,
}

async fn create_task(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(input): Json<CreateTaskInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let task = state.tasks.create_task(input).await?;
    Ok(created_response(task))
}

async fn list_tasks(
    State(state): State<AppState>,
    Query(params): Query<TaskListParams>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let defaults = PaginationParams::default();
    let page = PaginationParams {
        page: params.page.unwrap_or(defaults.page),
        per_page: params.per_page.unwrap_or(defaults.per_page),
    };
    let tasks = state
        .tasks
        .list_tasks(params.status, page.limit(), page.offset())
        .await?;
    Ok(Json(tasks))
}

async fn list_overdue_tasks(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let tasks = state.tasks.list_overdue(Utc::now()).await?;
    Ok(Json(tasks))
}

async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let task = state.tasks.get_task(id).await?;
    Ok(Json(task))
}

async fn update_task_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
    Json(payload): Json<StatusPayload>,
) -> Result<impl IntoResponse, ServiceError> {
    let task = state.tasks.update_status(id, payload.status).await?;
    Ok(Json(task))
}

async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    state.tasks.delete_task(id).await?;
    Ok(no_content_response())
}

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_task).get(list_tasks))
        .route("/overdue", get(list_overdue_tasks))
        .route("/:id", get(get_task).delete(delete_task))
        .route("/:id/status", post(update_task_status))
}
