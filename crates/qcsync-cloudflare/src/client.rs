//! reqwest-backed [`HttpTransport`]

use crate::error::{CloudflareError, Result};
use async_trait::async_trait;
use qcsync_core::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(45);

/// Blocking-per-call HTTP transport with a fixed timeout
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(CloudflareError::InvalidConfig(
                "HTTP timeout must be greater than zero".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("qcsync/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> HttpResponse {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
            HttpMethod::Delete => self.client.delete(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        tracing::debug!("{} {}", request.method, request.url);

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                if e.is_timeout() {
                    tracing::warn!("{} {} timed out", request.method, request.url);
                } else {
                    tracing::warn!("{} {} failed: {}", request.method, request.url, e);
                }
                return HttpResponse::transport_failure();
            }
        };

        let status = response.status().as_u16();
        match response.text().await {
            Ok(body) => HttpResponse::new(status, body),
            Err(e) => {
                tracing::warn!("Failed to read body from {}: {}", request.url, e);
                HttpResponse::new(status, String::new())
            }
        }
    }
}
