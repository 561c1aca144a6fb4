//! Cloudflare IP Access Rules API client
//!
//! Lists, creates, and deletes zone-level `whitelist` access rules using
//! legacy API-key authentication (`X-Auth-Email` / `X-Auth-Key`).

use async_trait::async_trait;
use qcsync_core::{
    Catalog, Credentials, HttpRequest, HttpResponse, HttpTransport, MutationOutcome, RuleCatalog,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";
pub const DEFAULT_PER_PAGE: u32 = 100;

const ALLOW_MODE: &str = "whitelist";

/// Zone access rules catalog
pub struct CloudflareAccessRules {
    transport: Arc<dyn HttpTransport>,
    credentials: Credentials,
    marker: String,
    api_base: String,
    per_page: u32,
}

impl CloudflareAccessRules {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        credentials: Credentials,
        marker: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            credentials,
            marker: marker.into(),
            api_base: CLOUDFLARE_API_BASE.to_string(),
            per_page: DEFAULT_PER_PAGE,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    fn rules_url(&self) -> String {
        format!(
            "{}/zones/{}/firewall/access_rules/rules",
            self.api_base, self.credentials.zone_id
        )
    }

    fn list_url(&self, page: u32) -> String {
        format!(
            "{}?page={}&per_page={}&mode={}",
            self.rules_url(),
            page,
            self.per_page,
            ALLOW_MODE
        )
    }

    fn rule_url(&self, rule_id: &str) -> String {
        format!("{}/{}", self.rules_url(), rule_id)
    }

    async fn send(&self, request: HttpRequest) -> HttpResponse {
        let request = request
            .with_header("X-Auth-Email", &self.credentials.email)
            .with_header("X-Auth-Key", &self.credentials.api_key)
            .with_header("Content-Type", "application/json");
        self.transport.send(request).await
    }
}

#[async_trait]
impl RuleCatalog for CloudflareAccessRules {
    async fn read_catalog(&self) -> Catalog {
        let mut catalog = Catalog::new();
        let mut page = 1;

        loop {
            let response = self.send(HttpRequest::get(self.list_url(page))).await;
            if !response.is_ok() {
                tracing::warn!(
                    "Access rule listing stopped at page {}: HTTP {}",
                    page,
                    response.status
                );
                break;
            }
            let Some(body) = response.json::<ApiListResponse>() else {
                tracing::warn!("Access rule listing stopped at page {}: invalid body", page);
                break;
            };
            if body.result.is_empty() {
                break;
            }

            tracing::debug!("Page {}: {} access rules", page, body.result.len());
            for rule in &body.result {
                let Some(ip) = rule.configuration.value.as_deref() else {
                    continue;
                };
                let notes = rule.notes.as_deref().unwrap_or("");
                catalog.record(&rule.id, ip, notes, &self.marker);
            }

            let info = body.result_info.unwrap_or_default();
            let current = info.page.unwrap_or(page);
            let total = info.total_pages.unwrap_or(1);
            if current >= total {
                break;
            }
            page += 1;
        }

        tracing::debug!(
            "Listed {} allow rules, {} managed",
            catalog.all_ips.len(),
            catalog.managed.len()
        );
        catalog
    }

    async fn create_rule(&self, ip: &str, notes: &str) -> MutationOutcome {
        let request_body = CreateAccessRuleRequest {
            mode: ALLOW_MODE.to_string(),
            configuration: RuleTarget {
                target: "ip".to_string(),
                value: ip.to_string(),
            },
            notes: notes.to_string(),
        };
        let body = match serde_json::to_value(&request_body) {
            Ok(body) => body,
            Err(e) => {
                return MutationOutcome::failed(
                    HttpResponse::TRANSPORT_FAILURE_STATUS,
                    e.to_string(),
                );
            }
        };

        let response = self.send(HttpRequest::post(self.rules_url(), body)).await;
        mutation_outcome(&response)
    }

    async fn delete_rule(&self, rule_id: &str) -> MutationOutcome {
        let response = self.send(HttpRequest::delete(self.rule_url(rule_id))).await;
        mutation_outcome(&response)
    }
}

/// Accepted iff HTTP 200 and the envelope does not report `success: false`
fn mutation_outcome(response: &HttpResponse) -> MutationOutcome {
    let envelope = response.json::<ApiMutationResponse>();
    let api_success = envelope.as_ref().and_then(|e| e.success).unwrap_or(true);

    if response.is_ok() && api_success {
        return MutationOutcome::ok(response.status);
    }

    let message = envelope
        .and_then(|e| e.errors.into_iter().next())
        .map(|e| e.message)
        .unwrap_or_else(|| format!("HTTP {}", response.status));
    MutationOutcome::failed(response.status, message)
}

// ============ API Types ============

#[derive(Debug, Deserialize)]
struct ApiListResponse {
    #[serde(default)]
    result: Vec<ApiAccessRule>,
    #[serde(default)]
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiAccessRule {
    #[serde(default)]
    id: String,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    configuration: ApiRuleConfiguration,
}

#[derive(Debug, Default, Deserialize)]
struct ApiRuleConfiguration {
    #[serde(default)]
    value: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ResultInfo {
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    total_pages: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ApiMutationResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[allow(dead_code)]
    #[serde(default)]
    code: i64,
    message: String,
}

#[derive(Debug, Serialize)]
struct CreateAccessRuleRequest {
    mode: String,
    configuration: RuleTarget,
    notes: String,
}

#[derive(Debug, Serialize)]
struct RuleTarget {
    target: String,
    value: String,
}
