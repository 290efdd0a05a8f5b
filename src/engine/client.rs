// src/engine/client.rs

use crate::config::AppConfig;
use crate::connectivity::HealthProbe;
use crate::engine::types::{ApiResponse, EngineCluster, EngineJob, EngineTemplate};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Thin HTTP client for the Engine API.
///
/// Every request carries a bounded timeout. Resource lookups come in two
/// flavours: `fetch_*` returns the detailed error, `get_*` collapses any
/// failure into `None` for presentation code.
#[derive(Debug, Clone)]
pub struct EngineClient {
    http: Client,
    base_url: Url,
    health_url: String,
    health_timeout: Duration,
    request_timeout: Duration,
}

impl EngineClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let base_url = Url::parse(&config.engine.base_url)?;
        let request_timeout = Duration::from_secs(config.engine.request_timeout_secs);

        let mut headers = HeaderMap::new();
        if let Some(token) = &config.engine.api_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                AppError::config_validation(
                    format!("API token is not a valid header value: {e}"),
                    Some("engine.api_token"),
                )
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = Client::builder()
            .connect_timeout(Duration::from_secs(config.engine.connect_timeout_secs))
            .timeout(request_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::HttpClient {
                message: format!("Failed to build HTTP client: {e}"),
                status_code: None,
            })?;

        info!(engine.url = %base_url, "Engine client created");

        Ok(Self {
            http,
            base_url,
            health_url: config.health_url(),
            health_timeout: config.poller.health_timeout(),
            request_timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn health_url(&self) -> &str {
        &self.health_url
    }

    /// One request against the health endpoint. Any 2xx is healthy; the body
    /// is ignored.
    pub async fn health(&self) -> Result<()> {
        let response = self
            .http
            .get(&self.health_url)
            .timeout(self.health_timeout)
            .send()
            .await
            .map_err(|e| map_send_error(e, self.health_timeout))?;

        let status = response.status();
        if status.is_success() {
            debug!(engine.health_url = %self.health_url, http.status_code = status.as_u16(), "Engine health check passed");
            Ok(())
        } else {
            Err(AppError::HttpClient {
                message: format!("Health endpoint returned {status}"),
                status_code: Some(status.as_u16()),
            })
        }
    }

    pub async fn fetch_cluster(&self, id: &str) -> Result<EngineCluster> {
        self.fetch_resource("clusters", id).await
    }

    pub async fn fetch_job(&self, id: &str) -> Result<EngineJob> {
        self.fetch_resource("jobs", id).await
    }

    pub async fn fetch_template(&self, id: &str) -> Result<EngineTemplate> {
        self.fetch_resource("templates", id).await
    }

    /// `None` means "not found or backend error"; the cause is only logged.
    pub async fn get_cluster(&self, id: &str) -> Option<EngineCluster> {
        found(self.fetch_cluster(id).await, "get_cluster")
    }

    pub async fn get_job(&self, id: &str) -> Option<EngineJob> {
        found(self.fetch_job(id).await, "get_job")
    }

    pub async fn get_template(&self, id: &str) -> Option<EngineTemplate> {
        found(self.fetch_template(id).await, "get_template")
    }

    async fn fetch_resource<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<T> {
        let url = self.resource_url(collection, id)?;
        debug!(engine.url = %url, "Fetching Engine resource");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| map_send_error(e, self.request_timeout))?;

        let status = response.status();
        let body = response.bytes().await?;

        // Error responses usually still carry the envelope with a reason
        match serde_json::from_slice::<ApiResponse<T>>(&body) {
            Ok(envelope) if status.is_success() => envelope.into_data(collection),
            Ok(envelope) => Err(match envelope.error {
                Some(error) => error.into(),
                None => AppError::HttpClient {
                    message: format!("Engine returned {status} for {collection}/{id}"),
                    status_code: Some(status.as_u16()),
                },
            }),
            Err(e) if status.is_success() => Err(e.into()),
            Err(_) => Err(AppError::HttpClient {
                message: format!("Engine returned {status} for {collection}/{id}"),
                status_code: Some(status.as_u16()),
            }),
        }
    }

    fn resource_url(&self, collection: &str, id: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| AppError::InvalidRequest {
                message: format!("Engine base URL cannot carry a path: {}", self.base_url),
            })?
            .pop_if_empty()
            .push(collection)
            .push(id);
        Ok(url)
    }
}

#[async_trait]
impl HealthProbe for EngineClient {
    async fn probe(&self) -> Result<()> {
        self.health().await
    }

    fn target(&self) -> &str {
        &self.health_url
    }
}

fn map_send_error(err: reqwest::Error, timeout: Duration) -> AppError {
    if err.is_timeout() {
        AppError::RequestTimeout {
            timeout_ms: timeout.as_millis() as u64,
        }
    } else {
        err.into()
    }
}

fn found<T>(result: Result<T>, context: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            e.log(context);
            None
        }
    }
}
