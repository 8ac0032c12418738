//! Server lifecycle.
//!
//! `Uninitialized → Configured → RoutesBuilt → Listening → Terminating → Stopped`

use std::fmt;
use std::future::IntoFuture;
use std::sync::Arc;

use axum::Router;
use chrono::Utc;
use common::config::AppConfig;
use common::errors::{AppError, AppResult};
use tokio::net::TcpListener;
use tracing::info;

use crate::connectors::ConnectorRegistry;
use crate::shutdown::{ShutdownCoordinator, ShutdownReason};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Configured,
    RoutesBuilt,
    Listening,
    Terminating,
    Stopped,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Uninitialized => "uninitialized",
            Phase::Configured => "configured",
            Phase::RoutesBuilt => "routes-built",
            Phase::Listening => "listening",
            Phase::Terminating => "terminating",
            Phase::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// The probe HTTP server and the state it moves through.
pub struct Server {
    config: Arc<AppConfig>,
    router: Router,
    shutdown: ShutdownCoordinator,
    phase: Phase,
}

impl Server {
    /// Builds the server and installs termination-signal handlers.
    ///
    /// Must be called from within a tokio runtime.
    pub fn initialize(config: AppConfig, connectors: ConnectorRegistry) -> Self {
        let shutdown = ShutdownCoordinator::new();
        shutdown.install_signal_handlers();
        Self::with_shutdown(config, connectors, shutdown)
    }

    /// Builds the server around an existing coordinator, without touching signals.
    pub fn with_shutdown(
        config: AppConfig,
        connectors: ConnectorRegistry,
        shutdown: ShutdownCoordinator,
    ) -> Self {
        let mut phase = Phase::Uninitialized;
        advance(&mut phase, Phase::Configured);

        tracing::debug!(backends = ?connectors.kinds(), "Building route table");
        let state = AppState::new(config, connectors);
        let config = state.config.clone();
        let router = crate::create_router(state);
        advance(&mut phase, Phase::RoutesBuilt);

        Self {
            config,
            router,
            shutdown,
            phase,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Binds the configured address and serves until shutdown.
    ///
    /// # Errors
    /// Returns `AppError::Bind` when the address cannot be bound.
    pub async fn start(&mut self) -> AppResult<ShutdownReason> {
        let addr = self.config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| AppError::Bind { addr, source })?;
        self.run(listener).await
    }

    /// Serves on an already bound listener until shutdown.
    ///
    /// After shutdown begins, in-flight requests get at most the configured
    /// shutdown timeout to finish. A repeated trigger ends the drain at once.
    /// The phase reads `Stopped` once this returns `Ok`.
    pub async fn run(&mut self, listener: TcpListener) -> AppResult<ShutdownReason> {
        let local_addr = listener
            .local_addr()
            .map_err(|e| AppError::Server(e.to_string()))?;
        advance(&mut self.phase, Phase::Listening);
        info!(
            service = crate::SERVICE_NAME,
            address = %local_addr,
            timestamp = %Utc::now().to_rfc2822(),
            "Probe service started on {}",
            local_addr
        );

        let router = std::mem::take(&mut self.router);
        let graceful = self.shutdown.clone();
        let serve = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                graceful.wait().await;
            })
            .into_future();

        let watcher = self.shutdown.clone();
        let drain_limit = self.config.shutdown_timeout;
        let deadline = async move {
            watcher.wait().await;
            tokio::time::sleep(drain_limit).await;
        };

        tokio::select! {
            result = serve => result.map_err(|e| AppError::Server(e.to_string()))?,
            _ = deadline => {
                tracing::warn!(timeout = ?drain_limit, "In-flight requests did not finish before the shutdown timeout");
            }
            _ = self.shutdown.wait_forced() => {
                tracing::warn!("Abandoning in-flight requests");
            }
        }
        advance(&mut self.phase, Phase::Terminating);

        let reason = self.shutdown.reason().unwrap_or(ShutdownReason::Exit);
        advance(&mut self.phase, Phase::Stopped);
        info!(timestamp = %Utc::now().to_rfc2822(), "Probe service stopped");
        Ok(reason)
    }
}

fn advance(phase: &mut Phase, next: Phase) {
    tracing::debug!(from = %phase, to = %next, "Lifecycle transition");
    *phase = next;
}
