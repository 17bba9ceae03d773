//! Axum WebSocket upgrade handler.

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::http::HeaderMap;
use axum::response::IntoResponse;

use super::connection::run_connection;
use crate::api::auth::profile_from_headers;
use crate::app_state::AppState;

/// `GET /ws` — Upgrade HTTP connection to WebSocket.
///
/// Identity headers are optional here: an anonymous connection can
/// still watch listings, while an authenticated one also receives its
/// user's notifications.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let event_rx = state.event_bus.subscribe();
    let user = profile_from_headers(&headers).map(|profile| profile.id);

    ws.on_upgrade(move |socket| run_connection(socket, event_rx, user))
}
