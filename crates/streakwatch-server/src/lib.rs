//! HTTP persistence endpoint for streak tracker snapshots.
//!
//! Holds the last saved snapshot in memory and mirrors every change to a
//! JSON file, so a restarted server serves what it had before. Trackers talk
//! to it through three verbs on one resource:
//!
//! - `GET    /api/v1/streaks`: last snapshot, or `null`
//! - `PUT    /api/v1/streaks`: replace the snapshot
//! - `DELETE /api/v1/streaks`: wipe it

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::get,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use streakwatch_core::stats::{StreakStats, summarize};
use streakwatch_core::store::{FileStore, RecordStore, TrackerSnapshot};

/// Shared server state.
struct AppState {
    current: Mutex<Option<TrackerSnapshot>>,
    store: FileStore,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    records: usize,
    tracking: Option<bool>,
    saved_at: Option<u64>,
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn internal_error(e: impl std::fmt::Display) -> HandlerError {
    log::warn!("Store operation failed: {e}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            success: false,
            error: e.to_string(),
        }),
    )
}

async fn handle_load(State(state): State<Arc<AppState>>) -> Json<Option<TrackerSnapshot>> {
    Json(state.current.lock().await.clone())
}

async fn handle_save(
    State(state): State<Arc<AppState>>,
    Json(snapshot): Json<TrackerSnapshot>,
) -> Result<StatusCode, HandlerError> {
    let mut current = state.current.lock().await;
    state.store.save(&snapshot).await.map_err(internal_error)?;
    log::debug!("Stored snapshot with {} records", snapshot.records.len());
    *current = Some(snapshot);
    Ok(StatusCode::NO_CONTENT)
}

async fn handle_clear(State(state): State<Arc<AppState>>) -> Result<StatusCode, HandlerError> {
    let mut current = state.current.lock().await;
    state.store.clear().await.map_err(internal_error)?;
    log::info!("Cleared stored streak records");
    *current = None;
    Ok(StatusCode::NO_CONTENT)
}

async fn handle_stats(State(state): State<Arc<AppState>>) -> Json<Option<StreakStats>> {
    let current = state.current.lock().await;
    Json(current.as_ref().and_then(|s| summarize(&s.records)))
}

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let current = state.current.lock().await;
    Json(HealthResponse {
        status: "healthy".to_string(),
        records: current.as_ref().map_or(0, |s| s.records.len()),
        tracking: current.as_ref().map(|s| s.tracking),
        saved_at: current.as_ref().map(|s| s.saved_at),
    })
}

async fn handle_index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "Streakwatch Server",
        "version": streakwatch_core::VERSION,
        "endpoints": {
            "/": "This API index",
            "/api/v1/streaks": {
                "GET": "Last saved tracker snapshot (null when none)",
                "PUT": "Replace the tracker snapshot (JSON body)",
                "DELETE": "Wipe all stored streak records",
            },
            "/api/v1/streaks/stats": "Statistics over stored records (null when none)",
            "/health": "Health check",
        },
    }))
}

/// Build the axum router, seeding in-memory state from `store`.
pub async fn build_router(store: FileStore) -> Router {
    let initial = match store.load().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            log::warn!(
                "Could not read {} (starting empty): {e}",
                store.path().display()
            );
            None
        }
    };

    let state = Arc::new(AppState {
        current: Mutex::new(initial),
        store,
    });

    Router::new()
        .route("/", get(handle_index))
        .route(
            "/api/v1/streaks",
            get(handle_load).put(handle_save).delete(handle_clear),
        )
        .route("/api/v1/streaks/stats", get(handle_stats))
        .route("/health", get(handle_health))
        .with_state(state)
}

/// Serve on an already-bound listener.
pub async fn serve(listener: TcpListener, store: FileStore) -> std::io::Result<()> {
    let app = build_router(store).await;
    axum::serve(listener, app).await
}

/// Run the HTTP persistence server until the process is stopped.
pub async fn run_server(store: FileStore, host: &str, port: u16) -> std::io::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr).await?;
    log::info!("Listening on http://{addr}, data in {}", store.path().display());
    serve(listener, store).await
}
