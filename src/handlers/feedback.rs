use axum::{
    extract::{Json, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::common::created_response;
use crate::{
    auth::AuthenticatedUser,
    entities::customer_feedback::FeedbackKind,
    errors::ServiceError,
    services::feedback::CreateFeedbackInput,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct RatingParams {
    pub kind: FeedbackKind,
}

async fn record_feedback(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(input): Json<CreateFeedbackInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let feedback = state.feedback.record_feedback(input).await?;
    Ok(created_response(feedback))
}

/// Mean rating for one feedback kind; null when nothing is rated yet.
async fn average_rating(
    State(state): State<AppState>,
    Query(params): Query<RatingParams>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let average = state.feedback.average_rating(params.kind).await?;
    Ok(Json(json!({ "kind": params.kind, "average_rating": average })))
}

pub fn feedback_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(record_feedback))
        .route("/average", get(average_rating))
}
