use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::post,
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use crate::{errors::ServiceError, AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct RequestOtpPayload {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpPayload {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 6))]
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: &'static str,
}

/// Emails a one-time login code to a registered customer.
async fn request_otp(
    State(state): State<AppState>,
    Json(payload): Json<RequestOtpPayload>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    state.otp.request_code(&payload.email).await?;
    Ok(Json(json!({ "message": "Verification code sent" })))
}

/// Exchanges a one-time code for a bearer token.
async fn verify_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyOtpPayload>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let token = state
        .otp
        .verify_code(&payload.email, &payload.code, Utc::now())
        .await?;
    Ok(Json(TokenResponse {
        token,
        token_type: "Bearer",
    }))
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/otp/request", post(request_otp))
        .route("/otp/verify", post(verify_otp))
}
