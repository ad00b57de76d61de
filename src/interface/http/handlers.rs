use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::application::{
    ChartRegistry, Direction, IdentityListing, InstanceScreen, InstanceScreenView, Preview, SummaryService,
    UsageService,
};
use crate::domain::{IdentityRef, QuotaKind, RenderedChart};
use crate::interface::web::{render, Assets};

/// Request error rendered as a plain-text response
#[derive(Debug)]
pub struct AppError(StatusCode, String);

impl AppError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self(StatusCode::BAD_REQUEST, message.into())
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self(StatusCode::NOT_FOUND, message.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub usage: Arc<UsageService>,
    pub charts: Arc<ChartRegistry>,
    pub summaries: Arc<SummaryService>,
    pub screen: Option<Arc<InstanceScreen>>,
}

/// Response for /api/identities
#[derive(Debug, Serialize)]
pub struct IdentitiesResponse {
    pub timestamp: String,
    pub identities: Vec<IdentityListing>,
}

/// Response for /api/provider/{provider}/identity/{identity}/chart/{kind}
#[derive(Debug, Serialize)]
pub struct ChartResponse {
    pub timestamp: String,
    pub identity: IdentityRef,
    pub chart: RenderedChart,
}

/// Response for /api/screen/instances
#[derive(Debug, Serialize)]
pub struct ScreenResponse {
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_error: Option<String>,
    #[serde(flatten)]
    pub screen: InstanceScreenView,
}

/// Body of a preview request
#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub delta: f64,
    #[serde(default = "default_direction")]
    pub direction: Direction,
}

fn default_direction() -> Direction {
    Direction::Add
}

/// Identity from the request path, limited to identities the service knows
async fn known_identity(state: &AppState, provider: String, identity: String) -> Result<IdentityRef, AppError> {
    let identity =
        IdentityRef::from_path(provider, identity).ok_or_else(|| AppError::bad_request("Invalid identity path"))?;
    if !state.summaries.is_known(&identity).await {
        return Err(AppError::not_found(format!("Unknown identity {}", identity)));
    }
    Ok(identity)
}

fn parse_kind(kind: &str) -> Result<QuotaKind, AppError> {
    kind.parse().map_err(AppError::bad_request)
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Handler for GET /api/health
pub async fn health_handler() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "service": "quotaboard"
        })),
    )
}

/// Handler for GET /api/identities
pub async fn identities_handler(State(state): State<AppState>) -> Json<IdentitiesResponse> {
    Json(IdentitiesResponse {
        timestamp: now(),
        identities: state.summaries.identities().await,
    })
}

/// Handler for GET /api/provider/{provider}/identity/{identity}/chart/{kind}
pub async fn chart_handler(
    State(state): State<AppState>,
    Path((provider, identity, kind)): Path<(String, String, String)>,
) -> Result<Json<ChartResponse>, AppError> {
    let kind = parse_kind(&kind)?;
    let identity = known_identity(&state, provider, identity).await?;

    let chart = state
        .charts
        .controller(&identity, kind)
        .refresh_or_current(&state.usage)
        .await;

    Ok(Json(ChartResponse {
        timestamp: now(),
        identity,
        chart,
    }))
}

/// Handler for POST /api/provider/{provider}/identity/{identity}/chart/{kind}/preview
pub async fn preview_handler(
    State(state): State<AppState>,
    Path((provider, identity, kind)): Path<(String, String, String)>,
    Json(request): Json<PreviewRequest>,
) -> Result<Json<Preview>, AppError> {
    let kind = parse_kind(&kind)?;
    if !request.delta.is_finite() || request.delta < 0.0 {
        return Err(AppError::bad_request("delta must be a non-negative number"));
    }

    let identity = known_identity(&state, provider, identity).await?;
    let controller = state.charts.controller(&identity, kind);
    if !controller.has_state().await {
        controller.refresh_or_current(&state.usage).await;
    }

    Ok(Json(controller.preview(request.delta, request.direction).await))
}

/// Handler for GET /api/provider/{provider}/identity/{identity}/summary
pub async fn summary_handler(
    State(state): State<AppState>,
    Path((provider, identity)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let identity = known_identity(&state, provider, identity).await?;
    let summary = state.summaries.summary(&identity).await;
    Ok(Json(summary.as_ref()).into_response())
}

/// Handler for GET /provider/{provider}/identity/{identity} (HTML fragment)
pub async fn summary_page_handler(
    State(state): State<AppState>,
    Path((provider, identity)): Path<(String, String)>,
) -> Result<Html<String>, AppError> {
    let identity = known_identity(&state, provider, identity).await?;
    let summary = state.summaries.summary(&identity).await;
    Ok(Html(render::identity_summary(&summary)))
}

/// Handler for GET /api/screen/instances
pub async fn screen_handler(State(state): State<AppState>) -> Result<Json<ScreenResponse>, AppError> {
    let screen = state
        .screen
        .as_ref()
        .ok_or_else(|| AppError::not_found("No identity selected"))?;

    Ok(Json(ScreenResponse {
        timestamp: now(),
        load_error: screen.load_error(),
        screen: screen.view(),
    }))
}

/// Handler for GET /
pub async fn index_handler() -> Response {
    static_asset("index.html")
}

/// Handler for GET /static/{*path}
pub async fn static_handler(Path(path): Path<String>) -> Response {
    static_asset(&path)
}

fn static_asset(path: &str) -> Response {
    match Assets::get(path) {
        Some(file) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.to_string())], file.data.into_owned()).into_response()
        }
        None => AppError::not_found(format!("No asset {}", path)).into_response(),
    }
}
