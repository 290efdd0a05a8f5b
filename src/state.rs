// src/state.rs

use crate::config::AppConfig;
use crate::connectivity::{ConnectivityStore, EngineStatus, HealthPoller};
use crate::engine::EngineClient;
use crate::error::Result;
use std::sync::Arc;
use tracing::info;

/// Everything the panel shares, built once at startup and handed out by
/// reference. There is exactly one connectivity store per `AppState`.
#[derive(Debug)]
pub struct AppState {
    pub config: AppConfig,
    pub engine: Arc<EngineClient>,
    pub connectivity: Arc<ConnectivityStore>,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Result<Self> {
        info!("Creating shared AppState: Engine client and connectivity store...");
        let engine = Arc::new(EngineClient::new(config)?);
        let connectivity = Arc::new(ConnectivityStore::new(
            engine.clone(),
            config.poller.health_timeout(),
        ));

        Ok(Self {
            config: config.clone(),
            engine,
            connectivity,
        })
    }

    /// A stopped poller on the configured cadence.
    pub fn health_poller(&self) -> Result<HealthPoller> {
        HealthPoller::new(self.connectivity.clone(), self.config.poller.interval())
    }

    pub fn engine_status(&self) -> EngineStatus {
        EngineStatus::activate(self.connectivity.clone())
    }
}
