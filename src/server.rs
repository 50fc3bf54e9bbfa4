//! HTTP surface over a dashboard session.
//!
//! This module provides an HTTP server that:
//! - Starts and stops recording via POST /recording/{start,stop}
//! - Classifies uploads described by name and MIME type via POST /classify
//! - Serves the history, histogram, rolling stats and CSV export
//!
//! # Architecture
//!
//! ```text
//! Dashboard UI ──→ POST /classify ──→ upload stub ──→ event store
//!      ↑                                                   │
//!      └──────── GET /events, /histogram, /stats ←─────────┘
//! ```

use crate::config::Config;
use crate::core::{HistogramState, RecordQuery, RollingStatsSnapshot, EXPORT_FILE_NAME};
use crate::events::{Category, DetectionEvent};
use crate::notify::Notification;
use crate::producers::{MediaItem, UploadError};
use crate::session::DashboardSession;
use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use crossbeam_channel::Receiver;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
    /// Session configuration
    pub session: Config,
}

impl ServerConfig {
    pub fn new(port: u16, session: Config) -> Self {
        Self { port, session }
    }
}

/// Shared server state
pub struct ServerState {
    session: DashboardSession,
    notifications: Receiver<Notification>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub recording: bool,
    pub events: usize,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Response from the recording endpoints
#[derive(Serialize)]
pub struct RecordingResponse {
    pub recording: bool,
    /// False when the request did not change the state
    pub changed: bool,
}

/// Upload described by the dashboard
#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub name: String,
    pub mime: String,
    #[serde(default)]
    pub size_bytes: u64,
}

/// Query string of GET /events
#[derive(Debug, Default, Deserialize)]
pub struct EventsParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub min_confidence: Option<u8>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, code: &str, error: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            code: code.to_string(),
        }),
    )
}

/// GET /health
async fn health(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        recording: state.session.is_recording(),
        events: state.session.store().len(),
    })
}

/// GET /events
async fn events(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<EventsParams>,
) -> Result<Json<Vec<DetectionEvent>>, ApiError> {
    let mut query = RecordQuery::new();
    if let Some(search) = params.search {
        query = query.search(search);
    }
    if let Some(label) = params.category {
        let category: Category = label
            .parse()
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, "INVALID_CATEGORY", e))?;
        query = query.category(category);
    }
    if let Some(min) = params.min_confidence {
        query = query.min_confidence(min);
    }

    Ok(Json(state.session.query(&query)))
}

/// GET /histogram
async fn histogram(State(state): State<Arc<ServerState>>) -> Json<HistogramState> {
    Json(state.session.histogram())
}

/// GET /stats
async fn stats(State(state): State<Arc<ServerState>>) -> Json<RollingStatsSnapshot> {
    Json(state.session.stats())
}

/// GET /notifications
///
/// Drains the notifications raised since the previous call.
async fn drain_notifications(State(state): State<Arc<ServerState>>) -> Json<Vec<Notification>> {
    Json(state.notifications.try_iter().collect())
}

/// GET /export.csv
async fn export_csv(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let csv = state.session.export_csv();
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
            ),
        ],
        csv,
    )
}

/// POST /recording/start
async fn start_recording(State(state): State<Arc<ServerState>>) -> Json<RecordingResponse> {
    let changed = state.session.start_recording();
    Json(RecordingResponse {
        recording: state.session.is_recording(),
        changed,
    })
}

/// POST /recording/stop
async fn stop_recording(State(state): State<Arc<ServerState>>) -> Json<RecordingResponse> {
    let changed = state.session.stop_recording();
    Json(RecordingResponse {
        recording: state.session.is_recording(),
        changed,
    })
}

/// POST /classify
///
/// Responds once the simulated processing delay has elapsed.
async fn classify(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<ClassifyRequest>,
) -> Result<Json<DetectionEvent>, ApiError> {
    let media = MediaItem::new(request.name, request.mime, request.size_bytes);

    state.session.classify(&media).await.map(Json).map_err(|e| {
        let (status, code) = match e {
            UploadError::UnsupportedMedia { .. } => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_MEDIA")
            }
            UploadError::AlreadyClassified(_) => (StatusCode::CONFLICT, "ALREADY_CLASSIFIED"),
            UploadError::Invalid(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INVALID_EVENT"),
            UploadError::Interrupted(_) => (StatusCode::SERVICE_UNAVAILABLE, "INTERRUPTED"),
        };
        api_error(status, code, e)
    })
}

/// Build the router for a session.
pub fn router(session: DashboardSession, receiver: Receiver<Notification>) -> Router {
    let state = Arc::new(ServerState {
        session,
        notifications: receiver,
    });

    Router::new()
        .route("/health", get(health))
        .route("/events", get(events))
        .route("/histogram", get(histogram))
        .route("/stats", get(stats))
        .route("/notifications", get(drain_notifications))
        .route("/export.csv", get(export_csv))
        .route("/recording/start", post(start_recording))
        .route("/recording/stop", post(stop_recording))
        .route("/classify", post(classify))
        .layer(
            CorsLayer::new()
                .allow_origin([
                    HeaderValue::from_static("http://localhost"),
                    HeaderValue::from_static("http://127.0.0.1"),
                ])
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(
    config: ServerConfig,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let (session, receiver) = DashboardSession::new(config.session)?;
    let app = router(session, receiver);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Dashboard server listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}
