use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use super::common::{created_response, no_content_response};
use crate::{
    auth::AuthenticatedUser,
    entities::automation_workflow::{TriggerConditions, TriggerType, WorkflowAction},
    errors::ServiceError,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct CreateWorkflowPayload {
    pub name: String,
    pub description: Option<String>,
    pub trigger_type: TriggerType,
    #[serde(default)]
    pub trigger_conditions: TriggerConditions,
    pub action: WorkflowAction,
}

#[derive(Debug, Deserialize)]
pub struct WorkflowListParams {
    pub trigger_type: Option<TriggerType>,
}

async fn create_workflow(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<CreateWorkflowPayload>,
) -> Result<impl IntoResponse, ServiceError> {
    let workflow = state
        .automation
        .create_workflow(
            payload.name,
            payload.description,
            payload.trigger_type,
            payload.trigger_conditions,
            payload.action,
        )
        .await?;
    Ok(created_response(workflow))
}

async fn list_workflows(
    State(state): State<AppState>,
    Query(params): Query<WorkflowListParams>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let workflows = state.automation.list_workflows(params.trigger_type).await?;
    Ok(Json(workflows))
}

async fn get_workflow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let workflow = state.automation.get_workflow(id).await?;
    Ok(Json(workflow))
}

async fn activate_workflow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let workflow = state.automation.set_workflow_active(id, true).await?;
    Ok(Json(workflow))
}

async fn deactivate_workflow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let workflow = state.automation.set_workflow_active(id, false).await?;
    Ok(Json(workflow))
}

async fn delete_workflow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    state.automation.delete_workflow(id).await?;
    Ok(no_content_response())
}

pub fn workflow_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_workflow).get(list_workflows))
        .route("/:id", get(get_workflow).delete(delete_workflow))
        .route("/:id/activate", post(activate_workflow))
        .route("/:id/deactivate", post(deactivate_workflow))
}
