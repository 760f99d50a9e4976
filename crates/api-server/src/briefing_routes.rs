use axum::{extract::State, routing::get, Extension, Json, Router};
use briefing_core::Report;
use chrono::Utc;
use serde::Serialize;

use crate::request_id::RequestId;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
}

pub fn briefing_routes() -> Router<AppState> {
    Router::new()
        .route("/briefing", get(get_briefing))
        .route("/health", get(health))
}

/// Always answers 200; pipeline failures are reported inside the message.
async fn get_briefing(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> Json<Report> {
    let report = state.pipeline.briefing(Utc::now()).await;
    if report.is_failure() {
        tracing::warn!(request_id = request_id.as_str(), "Served failed briefing");
    } else {
        tracing::info!(request_id = request_id.as_str(), "Served briefing");
    }
    Json(report)
}

async fn health() -> Json<HealthStatus> {
    Json(HealthStatus { status: "ok" })
}
