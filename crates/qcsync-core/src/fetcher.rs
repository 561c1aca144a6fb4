//! QUIC.cloud published IP list

use crate::error::{Result, SyncError};
use crate::provider::IpSource;
use crate::transport::{HttpRequest, HttpTransport};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

pub const QUIC_CLOUD_IPS_URL: &str = "https://quic.cloud/ips?json";

/// Fetches the QUIC.cloud node IPs with a single GET
pub struct QuicCloudFetcher {
    transport: Arc<dyn HttpTransport>,
    url: String,
}

impl QuicCloudFetcher {
    pub fn new(transport: Arc<dyn HttpTransport>, url: impl Into<String>) -> Self {
        Self {
            transport,
            url: url.into(),
        }
    }
}

#[async_trait]
impl IpSource for QuicCloudFetcher {
    async fn fetch_ips(&self) -> Result<Vec<String>> {
        tracing::debug!("Fetching provider IPs from {}", self.url);
        let response = self.transport.send(HttpRequest::get(&self.url)).await;

        if !response.is_ok() {
            return Err(SyncError::ProviderUnavailable(format!(
                "{} returned HTTP {}",
                self.url, response.status
            )));
        }

        let value: serde_json::Value = response.json().ok_or_else(|| {
            SyncError::ProviderUnavailable(format!("{} returned invalid JSON", self.url))
        })?;
        let entries = value.as_array().ok_or_else(|| {
            SyncError::ProviderUnavailable(format!("{} did not return a JSON array", self.url))
        })?;

        let mut seen = HashSet::new();
        let ips: Vec<String> = entries
            .iter()
            .filter_map(|v| v.as_str())
            .filter(|ip| !ip.is_empty())
            .filter(|ip| seen.insert(*ip))
            .map(str::to_string)
            .collect();

        tracing::debug!("Provider published {} IPs", ips.len());
        Ok(ips)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeTransport;
    use crate::transport::HttpMethod;

    fn fetcher(transport: &Arc<FakeTransport>) -> QuicCloudFetcher {
        QuicCloudFetcher::new(transport.clone(), QUIC_CLOUD_IPS_URL)
    }

    #[tokio::test]
    async fn test_fetch_preserves_order_and_dedups() {
        let transport = Arc::new(FakeTransport::new());
        transport.respond(
            HttpMethod::Get,
            QUIC_CLOUD_IPS_URL,
            200,
            r#"["2.2.2.2", "1.1.1.1", "2.2.2.2", 7, "", "2001:db8::1"]"#,
        );

        let ips = fetcher(&transport).fetch_ips().await.unwrap();
        assert_eq!(ips, vec!["2.2.2.2", "1.1.1.1", "2001:db8::1"]);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_non_200_is_unavailable() {
        let transport = Arc::new(FakeTransport::new());
        transport.respond(HttpMethod::Get, QUIC_CLOUD_IPS_URL, 503, "");

        let err = fetcher(&transport).fetch_ips().await.unwrap_err();
        assert!(matches!(err, SyncError::ProviderUnavailable(_)));
    }

    #[tokio::test]
    async fn test_non_array_body_is_unavailable() {
        let transport = Arc::new(FakeTransport::new());
        transport.respond(HttpMethod::Get, QUIC_CLOUD_IPS_URL, 200, r#"{"ips": []}"#);

        let err = fetcher(&transport).fetch_ips().await.unwrap_err();
        assert!(err.to_string().contains("JSON array"));
    }
}
