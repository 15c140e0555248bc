//! HTTP transport: axum router, request tracing, CORS, and static UI.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::service::ForecastService;
use crate::types::{
    HealthResponse, ModelInfoResponse, PredictionResponse, ServerError, ServerResult,
    ValidationIssue, WeatherInput,
};

use super::cors::cors_layer;

/// Router options that do not come from the loaded artifacts.
#[derive(Debug, Clone)]
pub struct RouterOptions {
    /// Directory served under `/static`; its `index.html` is served at `/`.
    pub static_dir: Option<PathBuf>,
    pub allowed_origins: Vec<String>,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            static_dir: None,
            allowed_origins: vec!["*".to_string()],
        }
    }
}

/// Shared state passed to all handlers via axum State.
pub struct ServerState {
    pub service: Arc<ForecastService>,
    pub index_html: Option<PathBuf>,
}

/// Build the application router.
pub fn router(service: Arc<ForecastService>, options: &RouterOptions) -> Router {
    let static_dir = options.static_dir.as_deref().filter(|d| d.is_dir());
    let index_html = static_dir
        .map(|d| d.join("index.html"))
        .filter(|p| p.is_file());

    let state = Arc::new(ServerState {
        service,
        index_html,
    });

    let mut app = Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/predict_temperature/", post(handle_predict))
        .route("/predict_temperature", post(handle_predict))
        .route("/model_info", get(handle_model_info))
        .route("/docs", get(handle_docs))
        .fallback(handle_not_found)
        .with_state(state);

    if let Some(dir) = static_dir {
        tracing::info!("Serving static files from {}", dir.display());
        app = app.nest_service("/static", ServeDir::new(dir));
    }

    app.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
                let request_id = req
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http",
                    method = %req.method(),
                    uri = %req.uri(),
                    request_id = %request_id,
                )
            }))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(cors_layer(&options.allowed_origins)),
    )
}

/// HTTP server bound to a fixed set of loaded artifacts.
pub struct HttpTransport {
    service: Arc<ForecastService>,
    options: RouterOptions,
}

impl HttpTransport {
    pub fn new(service: Arc<ForecastService>, options: RouterOptions) -> Self {
        Self { service, options }
    }

    /// Run the HTTP server on the given address until Ctrl-C.
    pub async fn run(&self, addr: &str) -> ServerResult<()> {
        let app = router(self.service.clone(), &self.options);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(ServerError::Io)?;

        tracing::info!("HTTP transport listening on {addr}");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Transport(e.to_string()))?;

        tracing::info!("HTTP transport stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Static UI when installed, JSON status otherwise.
async fn handle_root(State(state): State<Arc<ServerState>>) -> Response {
    if let Some(path) = &state.index_html {
        match read_index(path).await {
            Ok(html) => return Html(html).into_response(),
            Err(e) => tracing::warn!("Failed to read {}: {e}", path.display()),
        }
    }
    Json(state.service.root_status()).into_response()
}

async fn read_index(path: &Path) -> std::io::Result<String> {
    tokio::fs::read_to_string(path).await
}

async fn handle_health(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    Json(state.service.health())
}

async fn handle_predict(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<WeatherInput>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ServerError> {
    let Json(input) = payload.map_err(|rejection| {
        ServerError::Validation(vec![ValidationIssue::body(
            None,
            rejection.body_text(),
            rejection_kind(&rejection),
        )])
    })?;

    state.service.predict(&input).map(Json)
}

fn rejection_kind(rejection: &JsonRejection) -> &'static str {
    match rejection {
        JsonRejection::JsonDataError(_) => "json_data",
        JsonRejection::JsonSyntaxError(_) => "json_invalid",
        JsonRejection::MissingJsonContentType(_) => "content_type",
        _ => "body",
    }
}

async fn handle_model_info(State(state): State<Arc<ServerState>>) -> Json<ModelInfoResponse> {
    Json(state.service.model_info())
}

/// Machine-readable endpoint listing.
async fn handle_docs() -> Json<serde_json::Value> {
    Json(json!({
        "title": "Global Weather Forecast API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Predicts next-day Global Average Temperature using an Ensemble Stacking Regressor.",
        "endpoints": [
            { "method": "GET", "path": "/", "summary": "Web UI or service status" },
            { "method": "GET", "path": "/health", "summary": "Artifact load status" },
            {
                "method": "POST",
                "path": "/predict_temperature/",
                "summary": "Predict global average temperature for a target date",
                "body": {
                    "target_date": "YYYY-MM-DD (default: today)",
                    "pressure_mean": "mb, 900-1100 (default: 1014.0)",
                    "humidity_mean": "%, 0-100 (default: 60.0)",
                    "wind_mean": "kph, 0-200 (default: 10.0)",
                    "precip_mean": "mm, 0-500 (default: 0.5)"
                }
            },
            { "method": "GET", "path": "/model_info", "summary": "Trained model metadata" }
        ]
    }))
}

async fn handle_not_found() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not Found" })))
}
