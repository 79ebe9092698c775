//! Admin HTTP surface: concept read, forced fan-out and operational
//! probes. All content is JSON; failures surface as
//! `500 {"message": "<reason>"}`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use regex::Regex;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::sync::OnceLock;
use tracing::error;

use crate::health::HealthAggregator;
use crate::pipeline::{ConceptPipeline, ProcessOutcome};

static UUID_PATTERN: OnceLock<Regex> = OnceLock::new();

fn uuid_pattern() -> &'static Regex {
    UUID_PATTERN.get_or_init(|| {
        Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
            .expect("invalid uuid pattern")
    })
}

#[derive(Clone)]
pub struct ApiState {
    pub pipeline: Arc<ConceptPipeline>,
    pub health: Arc<HealthAggregator>,
}

#[derive(Serialize)]
struct MessageBody {
    message: String,
}

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/concept/{uuid}", get(get_concept))
        .route("/concept/{uuid}/send", post(send_concept))
        .route("/__health", get(health))
        .route("/__gtg", get(gtg))
        .route("/__build-info", get(build_info))
        .with_state(state)
}

fn bad_uuid(uuid: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(MessageBody {
            message: format!("Invalid concept uuid: {uuid}"),
        }),
    )
        .into_response()
}

fn internal_error(message: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(MessageBody { message }),
    )
        .into_response()
}

/// Aggregate on demand without touching any sink.
async fn get_concept(State(state): State<ApiState>, Path(uuid): Path<String>) -> Response {
    if !uuid_pattern().is_match(&uuid) {
        return bad_uuid(&uuid);
    }

    match state.pipeline.aggregator().aggregate(&uuid, "").await {
        Ok((concept, _)) => (StatusCode::OK, Json(concept)).into_response(),
        Err(e) => {
            error!(uuid = %uuid, error = %e, "On-demand aggregation failed");
            internal_error(e.to_string())
        }
    }
}

/// Force a full fan-out for one concept.
async fn send_concept(State(state): State<ApiState>, Path(uuid): Path<String>) -> Response {
    if !uuid_pattern().is_match(&uuid) {
        return bad_uuid(&uuid);
    }

    match state.pipeline.process(&uuid, "").await {
        Ok(ProcessOutcome::Unchanged) => (
            StatusCode::OK,
            Json(MessageBody {
                message: format!("Concept {uuid} unchanged"),
            }),
        )
            .into_response(),
        Ok(ProcessOutcome::Completed { updated }) => (
            StatusCode::OK,
            Json(MessageBody {
                message: format!("Concept {uuid} updated ({updated} ids)"),
            }),
        )
            .into_response(),
        Err(e) => {
            error!(uuid = %uuid, error = %e, "Forced fan-out failed");
            internal_error(e.to_string())
        }
    }
}

async fn health(State(state): State<ApiState>) -> Response {
    let report = state.health.report().await;
    (StatusCode::OK, Json(report)).into_response()
}

async fn gtg(State(state): State<ApiState>) -> Response {
    if state.health.healthy().await {
        (StatusCode::OK, "OK").into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "Not ready").into_response()
    }
}

async fn build_info() -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "version": env!("CARGO_PKG_VERSION"),
            "service": "concept-aggregation-service",
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_pattern_accepts_canonical_form() {
        assert!(uuid_pattern().is_match("28090964-9997-4bc2-9638-7a11135aaff9"));
    }

    #[test]
    fn uuid_pattern_rejects_variants() {
        for candidate in [
            "28090964/9997/4bc2/9638/7a11135aaff9",
            "28090964-9997-4bc2-9638",
            "28090964-9997-4BC2-9638-7a11135aaff9",
            "not-a-uuid",
        ] {
            assert!(!uuid_pattern().is_match(candidate), "{candidate}");
        }
    }
}
