//! Shared HTTP plumbing for providers: endpoint rotation, health marking and auth

use parking_lot::RwLock;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

use crate::config::ProviderConfig;
use crate::error::{AppError, Result};
use crate::provider::traits::ProviderError;

/// Consecutive failures before an endpoint is taken out of rotation
const UNHEALTHY_THRESHOLD: u32 = 3;

/// Provider endpoint status
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub url: String,
    pub healthy: bool,
    pub last_check: Option<Instant>,
    pub consecutive_failures: u32,
}

impl Endpoint {
    pub fn new(url: String) -> Self {
        Self {
            url,
            healthy: true,
            last_check: None,
            consecutive_failures: 0,
        }
    }

    pub fn mark_healthy(&mut self) {
        self.healthy = true;
        self.last_check = Some(Instant::now());
        self.consecutive_failures = 0;
    }

    pub fn mark_unhealthy(&mut self) {
        self.consecutive_failures += 1;
        if self.consecutive_failures >= UNHEALTHY_THRESHOLD {
            self.healthy = false;
        }
        self.last_check = Some(Instant::now());
    }
}

/// HTTP client bound to one provider's endpoints and credentials
pub struct HttpTransport {
    name: String,
    client: Client,
    endpoints: RwLock<Vec<Endpoint>>,
    cursor: AtomicUsize,
    auth_token: Option<String>,
    auth_header_name: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        if config.endpoints.is_empty() {
            return Err(AppError::InvalidRequest(format!(
                "Provider '{}' has no endpoints",
                config.name
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let endpoints = config
            .endpoints
            .iter()
            .map(|url| Endpoint::new(url.clone()))
            .collect();

        // Environment variable wins over an inline key
        let auth_token = config
            .auth
            .token_env
            .as_ref()
            .and_then(|var| std::env::var(var).ok())
            .or_else(|| config.auth.api_key.clone());

        Ok(Self {
            name: config.name.clone(),
            client,
            endpoints: RwLock::new(endpoints),
            cursor: AtomicUsize::new(0),
            auth_token,
            auth_header_name: config.auth.header_name.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.endpoints.read().clone()
    }

    fn headers(&self, extra: &[(&'static str, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = &self.auth_token {
            match &self.auth_header_name {
                Some(header_name) => {
                    if let (Ok(name), Ok(value)) = (
                        HeaderName::from_bytes(header_name.as_bytes()),
                        HeaderValue::from_str(token),
                    ) {
                        headers.insert(name, value);
                    }
                }
                None => {
                    if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                        headers.insert(AUTHORIZATION, value);
                    }
                }
            }
        }

        for (name, value) in extra {
            if let Ok(value) = HeaderValue::from_str(value) {
                headers.insert(HeaderName::from_static(name), value);
            }
        }

        headers
    }

    /// Pick the next endpoint, round-robin over healthy ones.
    /// When every endpoint is marked unhealthy all of them are eligible again.
    fn next_endpoint(&self) -> String {
        let endpoints = self.endpoints.read();
        let healthy: Vec<&Endpoint> = endpoints.iter().filter(|e| e.healthy).collect();
        let pool: Vec<&Endpoint> = if healthy.is_empty() {
            endpoints.iter().collect()
        } else {
            healthy
        };

        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % pool.len();
        pool[index].url.clone()
    }

    fn mark_endpoint_healthy(&self, url: &str) {
        let mut endpoints = self.endpoints.write();
        if let Some(endpoint) = endpoints.iter_mut().find(|e| e.url == url) {
            endpoint.mark_healthy();
        }
    }

    fn mark_endpoint_unhealthy(&self, url: &str) {
        let mut endpoints = self.endpoints.write();
        if let Some(endpoint) = endpoints.iter_mut().find(|e| e.url == url) {
            endpoint.mark_unhealthy();
            warn!(provider = %self.name, url = %url, failures = endpoint.consecutive_failures, "Endpoint call failed");
        }
    }

    /// POST a JSON body to `path` on the next endpoint and decode the JSON reply
    pub async fn post_json<B, R>(
        &self,
        path: &str,
        body: &B,
        extra_headers: &[(&'static str, &str)],
    ) -> std::result::Result<R, ProviderError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let endpoint = self.next_endpoint();
        let url = format!("{}{}", endpoint.trim_end_matches('/'), path);

        debug!(provider = %self.name, url = %url, "Sending provider request");

        let response = self
            .client
            .post(&url)
            .headers(self.headers(extra_headers))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                self.mark_endpoint_unhealthy(&endpoint);
                ProviderError::Http(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                self.mark_endpoint_unhealthy(&endpoint);
            }
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let decoded = response.json::<R>().await.map_err(|e| {
            error!(provider = %self.name, error = %e, "Failed to parse provider response");
            ProviderError::InvalidResponse(e.to_string())
        })?;

        self.mark_endpoint_healthy(&endpoint);
        Ok(decoded)
    }
}
