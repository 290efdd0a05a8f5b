// src/config/mod.rs

pub mod app;
pub mod loader;
pub mod validation;

pub use app::{AppConfig, EngineConfig, PollerConfig};
pub use loader::{load_config, save_config};
pub use validation::ConfigValidator;
