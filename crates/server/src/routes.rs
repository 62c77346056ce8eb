//! HTTP surface: router, handlers, and error → response mapping

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use service::{LeaderboardService, PromptRelay, ServiceError};
use std::collections::HashMap;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, warn};

use crate::APP_VERSION;

#[derive(Clone)]
pub struct AppState {
    pub leaderboard: LeaderboardService,
    pub relay: PromptRelay,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(api_health))
        .route(
            "/leaderboard",
            get(api_get_leaderboard)
                .post(api_post_score)
                .fallback(leaderboard_method_not_allowed),
        )
        .route(
            "/generate",
            post(api_generate).fallback(generate_method_not_allowed),
        )
        .with_state(state)
        .layer(cors)
}

// ============================================================================
// Errors
// ============================================================================

/// Handler-boundary error: every failure becomes `{ "error": ... }`
#[derive(Debug)]
pub struct ApiError(ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            warn!(error = %self.0, "Rejected request");
            StatusCode::BAD_REQUEST
        } else {
            // Full detail stays server-side
            error!(error = %self.0, "Request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };

        (status, Json(json!({ "error": self.0.public_message() }))).into_response()
    }
}

/// Bodies that are missing or not JSON are treated as `{}`
fn parse_body(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap_or_else(|_| json!({}))
}

fn method_not_allowed(method: &Method, allow: &'static str) -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, allow)],
        Json(json!({ "error": format!("Method {} not allowed", method) })),
    )
        .into_response()
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /health
async fn api_health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "quizrush",
        "version": APP_VERSION,
    }))
}

/// GET /leaderboard?limit=N — ranked top scores
async fn api_get_leaderboard(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let scores = state
        .leaderboard
        .top_scores(params.get("limit").map(String::as_str))
        .await?;

    Ok(Json(json!({ "scores": scores })))
}

/// POST /leaderboard — submit a score
async fn api_post_score(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let submission = state.leaderboard.submit(&parse_body(&body)).await?;
    Ok((StatusCode::CREATED, Json(json!({ "score": submission.score }))))
}

async fn leaderboard_method_not_allowed(method: Method) -> Response {
    method_not_allowed(&method, "GET, POST")
}

/// POST /generate — relay a prompt to Gemini
async fn api_generate(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let response = state.relay.relay(&parse_body(&body)).await?;
    Ok(Json(response))
}

async fn generate_method_not_allowed(method: Method) -> Response {
    method_not_allowed(&method, "POST")
}

// ============================================================================
// Tests
// ============================================================================
