use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::post,
    Router,
};

use super::common::created_response;
use crate::{
    auth::AuthenticatedUser,
    errors::ServiceError,
    services::interactions::CreateInteractionInput,
    AppState,
};

async fn record_interaction(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(input): Json<CreateInteractionInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let interaction = state.interactions.record_interaction(input).await?;
    Ok(created_response(interaction))
}

pub fn interaction_routes() -> Router<AppState> {
    Router::new().route("/", post(record_interaction))
}
