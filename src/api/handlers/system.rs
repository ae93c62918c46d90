//! System endpoints: health check.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::domain::PoolState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `"healthy"` while the pool runs, `"degraded"` once it has stopped.
    pub status: String,
    /// RFC 3339 timestamp of the check.
    pub timestamp: String,
    /// Crate version.
    pub version: String,
    /// Pool lifecycle state (`running` or `stopped`).
    #[schema(value_type = String, example = "running")]
    pub pool_state: PoolState,
    /// Number of registered clients.
    pub members: usize,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health, version, pool state and the number of connected clients.",
    responses(
        (status = 200, description = "Pool is running", body = HealthResponse),
        (status = 503, description = "Pool has stopped; restart required", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let pool = state.pool.status();
    let running = pool.state == PoolState::Running && state.pool.is_running();
    let (status_code, status, pool_state) = if running {
        (StatusCode::OK, "healthy", PoolState::Running)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded", PoolState::Stopped)
    };
    (
        status_code,
        Json(HealthResponse {
            status: status.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            pool_state,
            members: pool.members,
        }),
    )
}

/// System routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_handler))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::config::{HubConfig, PoolConfig};
    use crate::domain::Pool;

    async fn get_health(state: AppState) -> (StatusCode, serde_json::Value) {
        let app = routes().with_state(state);
        let Ok(request) = Request::builder().uri("/health").body(Body::empty()) else {
            panic!("request build failed");
        };
        let Ok(response) = app.oneshot(request).await else {
            panic!("router failed");
        };
        let status = response.status();
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body read failed");
        };
        let Ok(json) = serde_json::from_slice(&bytes) else {
            panic!("body is not JSON");
        };
        (status, json)
    }

    #[tokio::test]
    async fn healthy_while_pool_runs() {
        let (pool, _join) = Pool::spawn(PoolConfig::default());
        let (status, body) = get_health(AppState::new(pool, HubConfig::default())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["pool_state"], "running");
        assert_eq!(body["members"], 0);
    }

    #[tokio::test]
    async fn degraded_after_pool_stops() {
        let (actor, pool) = Pool::new(PoolConfig::default());
        let task = tokio::spawn(actor.run());
        let state = AppState::new(pool, HubConfig::default());
        task.abort();
        let _ = tokio::time::timeout(Duration::from_secs(1), task).await;

        let (status, body) = get_health(state).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["pool_state"], "stopped");
    }
}
