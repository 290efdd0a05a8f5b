// src/connectivity/poller.rs

use crate::connectivity::ConnectivityStore;
use crate::error::{AppError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Fixed cadence between automatic health checks. The cadence deliberately
/// does not depend on whether the Engine is online.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(20);

struct ActivePoll {
    generation: u64,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Drives [`ConnectivityStore::check_health`] on a fixed interval.
///
/// `start` fires one check immediately, then one per interval. Checks are
/// spawned, so a slow Engine never stretches the cadence. `stop` cancels the
/// timer together with any check still in flight.
pub struct HealthPoller {
    store: Arc<ConnectivityStore>,
    period: Duration,
    generation: u64,
    active: Option<ActivePoll>,
}

impl HealthPoller {
    /// Fails if `period` is zero, which would leave no cadence to poll on.
    pub fn new(store: Arc<ConnectivityStore>, period: Duration) -> Result<Self> {
        if period.is_zero() {
            return Err(AppError::config_validation(
                "Poll interval must be greater than zero",
                Some("poller.interval_secs"),
            ));
        }

        Ok(Self {
            store,
            period,
            generation: 0,
            active: None,
        })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Starts polling. Returns `false` if the poller was already running, in
    /// which case nothing changes.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&mut self) -> bool {
        if let Some(active) = &self.active {
            debug!(poller.generation = active.generation, "Health poller already running");
            return false;
        }

        self.generation += 1;
        let generation = self.generation;
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(
            self.store.clone(),
            self.period,
            cancel.clone(),
            generation,
        ));

        info!(
            poller.generation = generation,
            poller.interval = ?self.period,
            "Health poller started"
        );

        self.active = Some(ActivePoll {
            generation,
            cancel,
            handle,
        });
        true
    }

    /// Stops polling. Returns `false` if the poller was not running.
    pub fn stop(&mut self) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };

        active.cancel.cancel();
        active.handle.abort();
        info!(poller.generation = active.generation, "Health poller stopped");
        true
    }
}

impl Drop for HealthPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop(
    store: Arc<ConnectivityStore>,
    period: Duration,
    cancel: CancellationToken,
    generation: u64,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!(poller.generation = generation, in_flight = in_flight.len(), "Health poller cancelled");
                break;
            }

            // First tick completes immediately
            _ = ticker.tick() => {
                let store = store.clone();
                in_flight.spawn(async move {
                    store.check_health().await;
                });
            }

            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined {
                    if e.is_panic() {
                        error!(poller.generation = generation, error = %e, "Health check task panicked");
                    }
                }
            }
        }
    }

    in_flight.abort_all();
}
