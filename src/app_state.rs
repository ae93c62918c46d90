//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::HubConfig;
use crate::domain::PoolHandle;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Front door of the running pool.
    pub pool: PoolHandle,
    /// Loaded configuration.
    pub config: Arc<HubConfig>,
}

impl AppState {
    /// Bundles a pool handle with the configuration.
    #[must_use]
    pub fn new(pool: PoolHandle, config: HubConfig) -> Self {
        Self {
            pool,
            config: Arc::new(config),
        }
    }
}
