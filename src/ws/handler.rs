//! Axum WebSocket upgrade handlers.
//!
//! The upgrade is the only place a [`Client`] is created: the origin policy
//! and buffer hints are applied first, and a handshake fault is answered
//! over HTTP without touching the pool.

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::http::{HeaderMap, header};
use axum::response::IntoResponse;
use axum::routing::get;

use super::echo::run_echo;
use super::socket::into_connection;
use crate::app_state::AppState;
use crate::config::{ClientConfig, HubConfig};
use crate::domain::{Client, ClientId, PoolHandle};
use crate::error::HubError;

/// `GET /ws` — Upgrade to a hub connection.
///
/// # Errors
///
/// Returns [`HubError::OriginRejected`] when the origin is not allowed and
/// [`HubError::PoolStopped`] once the pool control loop has exited.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, HubError> {
    check_origin(&state.config, &headers)?;
    if !state.pool.is_running() {
        return Err(HubError::PoolStopped);
    }

    let pool = state.pool.clone();
    let config = state.config.client;
    Ok(apply_buffer_hints(ws, &state.config)
        .on_upgrade(move |socket| serve_client(socket, pool, config)))
}

/// `GET /echo` — Upgrade to an echo connection.
///
/// # Errors
///
/// Returns [`HubError::OriginRejected`] when the origin is not allowed.
pub async fn echo_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, HubError> {
    check_origin(&state.config, &headers)?;
    Ok(apply_buffer_hints(ws, &state.config).on_upgrade(|socket| async move {
        if let Err(e) = run_echo(into_connection(socket)).await {
            tracing::debug!(error = %e, "echo connection ended");
        }
    }))
}

/// WebSocket routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/echo", get(echo_handler))
}

async fn serve_client(socket: WebSocket, pool: PoolHandle, config: ClientConfig) {
    let (writer, reader) = into_connection(socket).into_parts();
    let client = Client::new(ClientId::new(), writer, pool, config);
    tracing::info!(client_id = %client.id(), "client connected");

    client.register().await;
    // Faults are logged by the read loop itself.
    let _ = client.run(reader).await;
}

fn apply_buffer_hints(ws: WebSocketUpgrade, config: &HubConfig) -> WebSocketUpgrade {
    ws.read_buffer_size(config.read_buffer_size)
        .write_buffer_size(config.write_buffer_size)
}

fn check_origin(config: &HubConfig, headers: &HeaderMap) -> Result<(), HubError> {
    let origin = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok());
    if config.origin_allowed(origin) {
        Ok(())
    } else {
        tracing::warn!(origin = ?origin, "rejected handshake from disallowed origin");
        Err(HubError::OriginRejected(origin.unwrap_or_default().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn origin_check_uses_allow_list() {
        let config = HubConfig {
            allowed_origins: vec!["https://ok.example".to_string()],
            ..HubConfig::default()
        };
        let mut headers = HeaderMap::new();
        assert!(check_origin(&config, &headers).is_ok());

        headers.insert(header::ORIGIN, HeaderValue::from_static("https://ok.example"));
        assert!(check_origin(&config, &headers).is_ok());

        headers.insert(header::ORIGIN, HeaderValue::from_static("https://bad.example"));
        assert!(matches!(
            check_origin(&config, &headers),
            Err(HubError::OriginRejected(o)) if o == "https://bad.example"
        ));
    }

    #[test]
    fn default_policy_accepts_any_origin() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ORIGIN, HeaderValue::from_static("https://x.example"));
        assert!(check_origin(&HubConfig::default(), &headers).is_ok());
    }
}
