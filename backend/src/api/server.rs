//! HTTP server for the catalog transfer.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                          |
//! |--------|-------------------|--------------------------------------|
//! | GET    | `/health`         | Health check                         |
//! | POST   | `/api/transfer`   | Run a transfer between two files     |
//! | GET    | `/api/logs`       | SSE stream for real-time logs        |

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{LogSink, MemoryLog, Tee, LOG_BROADCASTER};
use super::types::{error_response, status_for, TransferRequest, TransferResponse};
use crate::config::AllowedCategories;
use crate::layout::ColumnLayout;
use crate::transfer::{run_transfer, TransferSession};

/// Configuration shared by every request.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub categories: AllowedCategories,
    pub layout: ColumnLayout,
}

type ApiError = (StatusCode, Json<Value>);

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/transfer", post(transfer_files))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Start the HTTP server
pub async fn start_server(port: u16, state: AppState) -> Result<(), Box<dyn std::error::Error>> {
    let categories = state.categories.to_string();
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Catalog transfer server running on http://localhost:{}", port);
    println!("   POST /api/transfer - Copy rows between two files");
    println!("   GET  /api/logs     - SSE log stream");
    println!("   GET  /health       - Health check");
    println!();
    println!("📂 Allowed categories: {}", categories);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "catalog-transfer",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "transfer": "POST /api/transfer",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        // Lagged receivers drop entries
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Transfer endpoint. Runs on the blocking pool; the workbook libraries are synchronous.
async fn transfer_files(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<TransferResponse>, ApiError> {
    let run_log = Arc::new(MemoryLog::new());
    let sink: Arc<dyn LogSink> = Arc::new(Tee(LOG_BROADCASTER.clone(), run_log.clone()));

    let mut session = TransferSession::new(state.categories.clone())
        .with_source_sheet(request.source_sheet.clone())
        .with_destination_sheet(request.destination_sheet.clone())
        .with_layout(state.layout.clone())
        .with_options(request.options())
        .with_log(sink);
    session.source = request.source;
    session.destination = request.destination;

    let result = tokio::task::spawn_blocking(move || run_transfer(&session))
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(error_response("internal", &e.to_string(), run_log.entries())),
            )
        })?;

    match result {
        Ok(summary) => Ok(Json(TransferResponse::new(summary, run_log.entries()))),
        Err(e) => Err((
            status_for(&e),
            Json(error_response(e.kind(), &e.to_string(), run_log.entries())),
        )),
    }
}
