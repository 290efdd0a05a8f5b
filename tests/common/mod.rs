//! Common test utilities and fixtures
#![allow(dead_code)]

use async_trait::async_trait;
use factory_panel::{
    config::AppConfig,
    connectivity::{ConnectivityStore, HealthProbe},
    error::{AppError, Result},
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

pub const TEST_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// One scripted probe outcome
#[derive(Debug, Clone, Copy)]
pub struct Step {
    pub delay: Duration,
    pub healthy: bool,
}

impl Step {
    pub fn ok() -> Self {
        Self { delay: Duration::ZERO, healthy: true }
    }

    pub fn fail() -> Self {
        Self { delay: Duration::ZERO, healthy: false }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Probe that replays a fixed script, then keeps returning `fallback`.
pub struct ScriptedProbe {
    script: Mutex<VecDeque<Step>>,
    fallback: bool,
    calls: AtomicUsize,
}

impl ScriptedProbe {
    pub fn new(outcomes: impl IntoIterator<Item = bool>) -> Arc<Self> {
        Self::with_steps(outcomes.into_iter().map(|healthy| Step {
            delay: Duration::ZERO,
            healthy,
        }))
    }

    pub fn with_steps(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(steps.into_iter().collect()),
            fallback: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn always(healthy: bool) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            fallback: healthy,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HealthProbe for ScriptedProbe {
    async fn probe(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.script.lock().pop_front().unwrap_or(Step {
            delay: Duration::ZERO,
            healthy: self.fallback,
        });

        if !step.delay.is_zero() {
            tokio::time::sleep(step.delay).await;
        }

        if step.healthy {
            Ok(())
        } else {
            Err(AppError::HttpClient {
                message: "engine unavailable".to_string(),
                status_code: Some(503),
            })
        }
    }

    fn target(&self) -> &str {
        "scripted"
    }
}

/// Probe that blocks until the test releases it.
pub struct GatedProbe {
    gate: Semaphore,
    healthy: bool,
    calls: AtomicUsize,
}

impl GatedProbe {
    pub fn new(healthy: bool) -> Arc<Self> {
        Arc::new(Self {
            gate: Semaphore::new(0),
            healthy,
            calls: AtomicUsize::new(0),
        })
    }

    /// Lets one pending (or future) probe through
    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HealthProbe for GatedProbe {
    async fn probe(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| AppError::internal(e.to_string()))?;
        permit.forget();

        if self.healthy {
            Ok(())
        } else {
            Err(AppError::HttpClient {
                message: "connection refused".to_string(),
                status_code: None,
            })
        }
    }
}

/// Probe that never answers
pub struct HangingProbe;

#[async_trait]
impl HealthProbe for HangingProbe {
    async fn probe(&self) -> Result<()> {
        std::future::pending::<()>().await;
        Ok(())
    }
}

/// Probe whose implementation panics on every call
pub struct PanickingProbe;

#[async_trait]
impl HealthProbe for PanickingProbe {
    async fn probe(&self) -> Result<()> {
        panic!("engine probe exploded");
    }
}

pub fn store_with(probe: Arc<dyn HealthProbe>) -> Arc<ConnectivityStore> {
    Arc::new(ConnectivityStore::new(probe, TEST_CHECK_TIMEOUT))
}

/// Records every state a listener observes
pub fn recorder() -> (Arc<Mutex<Vec<bool>>>, impl Fn(&factory_panel::ConnectivityState) + Send + Sync + 'static) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    (seen, move |state: &factory_panel::ConnectivityState| {
        sink.lock().push(state.is_online)
    })
}

/// Test configuration builder
pub struct TestConfigBuilder {
    config: AppConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.engine.base_url = url.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.config.engine.api_token = Some(token.into());
        self
    }

    pub fn with_health_timeout_secs(mut self, secs: u64) -> Self {
        self.config.poller.health_timeout_secs = secs;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Mock HTTP server standing in for the Engine
pub struct MockServer {
    pub server: wiremock::MockServer,
}

impl MockServer {
    pub async fn start() -> Self {
        Self {
            server: wiremock::MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Engine base URL as the panel expects it
    pub fn api_url(&self) -> String {
        format!("{}/api", self.uri())
    }
}

/// Environment setup for tests
pub fn setup_test_env() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}
