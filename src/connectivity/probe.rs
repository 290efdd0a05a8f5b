// src/connectivity/probe.rs

use crate::error::Result;
use async_trait::async_trait;

/// A single reachability check against the Engine.
///
/// `Ok(())` means the Engine answered; any error means it is offline for the
/// purpose of the connectivity store.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self) -> Result<()>;

    /// Human-readable target, used in log fields
    fn target(&self) -> &str {
        "engine"
    }
}

