//! Application state for the probe service.

use std::sync::Arc;

use common::config::AppConfig;

use crate::connectors::ConnectorRegistry;
use crate::service::ProbeService;

/// Application state shared across handlers. Immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub connectors: Arc<ConnectorRegistry>,
}

impl AppState {
    pub fn new(config: AppConfig, connectors: ConnectorRegistry) -> Self {
        Self {
            config: Arc::new(config),
            connectors: Arc::new(connectors),
        }
    }

    /// A probe service over this state's configuration and connectors.
    pub fn probe_service(&self) -> ProbeService {
        ProbeService::new(self.config.clone(), self.connectors.clone())
    }
}
