//! HTTP + WebSocket surface: the shared [`AppState`], the axum
//! [`Router`](axum::Router) it's served behind, and the background tasks
//! that keep every room moving without a client connection driving them —
//! the global round-timer sweep (§4.3) and the idle-room reaper.

use std::path::Path;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use adabra_room::{RoomRegistry, TICK_INTERVAL_MS};
use adabra_timer::TickScheduler;

use crate::handler::ws_handler;
use crate::time::now_ms;

/// Shared state handed to every axum handler. Cheap to clone: the
/// registry is itself an `Arc`-backed map of room handles.
#[derive(Clone)]
pub struct AppState {
    pub rooms: RoomRegistry,
}

impl AppState {
    pub fn new() -> Self {
        Self { rooms: RoomRegistry::new() }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Assembles the full router: static pages, the room-creation endpoint,
/// a health check, and the WebSocket upgrade. `web_root` holds the
/// static host/play/screen pages plus any client assets.
pub fn build_router(state: AppState, web_root: &Path) -> Router {
    Router::new()
        .route("/api/rooms/create", get(create_room))
        .route("/healthz", get(healthz))
        .route("/ws", get(ws_handler))
        .route_service("/host", ServeFile::new(web_root.join("host.html")))
        .route_service("/play", ServeFile::new(web_root.join("play.html")))
        .route_service("/screen", ServeFile::new(web_root.join("screen.html")))
        .fallback_service(ServeDir::new(web_root.to_path_buf()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRoomResponse {
    room_code: String,
    host_key: String,
}

/// `GET /api/rooms/create`: allocates a fresh room and returns its code
/// and host key. The host key is handed back out of band here; it is
/// never broadcast to the room itself.
async fn create_room(State(state): State<AppState>) -> impl IntoResponse {
    match state.rooms.create_room(now_ms()) {
        Ok((room_code, host_key, _handle)) => {
            Json(CreateRoomResponse { room_code: room_code.0, host_key }).into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "failed to create room");
            (axum::http::StatusCode::SERVICE_UNAVAILABLE, err.to_string()).into_response()
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    rooms: usize,
}

async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        rooms: state.rooms.room_count(),
    })
}

/// Spawns the process-wide round-timer sweep: a fixed-cadence (5 Hz)
/// loop that calls [`RoomHandle::tick`](adabra_room::RoomHandle::tick) on
/// every registered room, decrementing `remainingMs` by wall-clock delta
/// rather than by tick count.
pub fn spawn_tick_sweep(state: AppState) -> tokio::task::JoinHandle<()> {
    let rate_hz = (1000 / TICK_INTERVAL_MS) as u32;
    tokio::spawn(async move {
        let mut scheduler = TickScheduler::with_rate(rate_hz);
        loop {
            scheduler.wait_for_tick().await;
            let now = now_ms();
            for handle in state.rooms.all_handles() {
                let _ = handle.tick(now).await;
            }
            scheduler.record_tick_end();
        }
    })
}
