//! HTTP/WebSocket API for the game server.
//!
//! # Endpoints
//!
//! - `POST /api/rooms` - Create a room, returns its code
//! - `GET /api/rooms/{room_id}` - Room state snapshot
//! - `GET /ws/{room_id}?role=host|player&name=...` - WebSocket connection
//! - `GET /health` - Server health status
//!
//! The host creates a room over HTTP, shows the code on its screen, and
//! connects to the WebSocket as `role=host`; players type the code in and
//! connect as `role=player`. All gameplay flows over the WebSocket.

pub mod websocket;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use sequence_recall::{RoomRegistry, RoomStateResponse, game::entities::RoomId};
use serde::Serialize;
use tower_http::cors::CorsLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RoomRegistry>,
}

/// Create the router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/rooms", post(create_room))
        .route("/api/rooms/{room_id}", get(room_state))
        .route("/ws/{room_id}", get(websocket::websocket_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Serialize)]
struct RoomCreated {
    room_id: RoomId,
}

async fn create_room(State(state): State<AppState>) -> Json<RoomCreated> {
    let room_id = state.registry.create_room().await;
    Json(RoomCreated { room_id })
}

async fn room_state(
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
) -> Result<Json<RoomStateResponse>, StatusCode> {
    state
        .registry
        .room_state(room_id)
        .await
        .map(Json)
        .map_err(|_| StatusCode::NOT_FOUND)
}
