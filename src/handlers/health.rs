use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use sea_orm::{ConnectionTrait, Statement};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Up,
    Down,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: ComponentStatus,
    database: ComponentStatus,
    version: &'static str,
}

/// Liveness plus a database ping.
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let db_status = match state
        .db
        .execute(Statement::from_string(
            state.db.get_database_backend(),
            "SELECT 1".to_string(),
        ))
        .await
    {
        Ok(_) => ComponentStatus::Up,
        Err(_) => ComponentStatus::Down,
    };

    Json(HealthResponse {
        status: db_status,
        database: db_status,
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
