// src/engine/mod.rs

pub mod client;
pub mod types;

pub use client::EngineClient;
pub use types::{
    ApiErrorBody, ApiResponse, ClusterPayload, ClusterStatus, EngineCluster, EngineJob,
    EngineTemplate, JobStatus,
};
