//! HTTP trigger
//!
//! `GET /?action=print|insert` runs the pipeline and answers with the
//! rendered outcome as plain text. Failures are rendered the same way and
//! still answer 200, so callers read the body rather than the status.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::middleware;
use crate::pipeline::Pipeline;

/// State shared by every request
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TriggerQuery {
    #[serde(default)]
    pub action: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(trigger))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(middleware::tracing_layer())
}

/// Run the requested action
///
/// GET /?action=insert
async fn trigger(State(state): State<AppState>, Query(query): Query<TriggerQuery>) -> String {
    match state.pipeline.run(&query.action).await {
        Ok(report) => {
            info!(run_id = %report.run_id, action = %report.action, "Action executed");
            report.render()
        },
        Err(e) => {
            error!(action = %query.action, error = %e, "Action failed");
            e.to_string()
        },
    }
}

/// Warehouse connectivity check
async fn health_check(State(state): State<AppState>) -> Response {
    match state.pipeline.loader().sink().ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "warehouse": "connected"
            })),
        )
            .into_response(),
        Err(e) => {
            error!("Warehouse health check failed: {:#}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "warehouse": "unreachable"
                })),
            )
                .into_response()
        },
    }
}
