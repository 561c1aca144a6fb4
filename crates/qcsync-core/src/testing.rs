//! In-memory doubles for the transport and the remote services

use crate::catalog::{Catalog, FirewallRule};
use crate::error::{Result, SyncError};
use crate::provider::{IpSource, MutationOutcome, RuleCatalog};
use crate::transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

/// Transport answering from a fixed route table and recording every request.
/// Unrouted requests get a 404.
#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<Vec<(HttpMethod, String, HttpResponse)>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `method url` to a canned response. Later routes win.
    pub fn respond(&self, method: HttpMethod, url: &str, status: u16, body: &str) {
        self.routes.lock().unwrap().insert(
            0,
            (method, url.to_string(), HttpResponse::new(status, body)),
        );
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn send(&self, request: HttpRequest) -> HttpResponse {
        let response = self
            .routes
            .lock()
            .unwrap()
            .iter()
            .find(|(m, u, _)| *m == request.method && *u == request.url)
            .map(|(_, _, r)| r.clone())
            .unwrap_or_else(|| HttpResponse::new(404, ""));
        self.requests.lock().unwrap().push(request);
        response
    }
}

#[derive(Default)]
struct CloudState {
    provider: Option<Vec<String>>,
    rules: Vec<FirewallRule>,
    next_id: u32,
    failing_ips: HashSet<String>,
    deleted: Vec<String>,
    mutations: usize,
}

/// QUIC.cloud and Cloudflare rolled into one in-memory fake
pub struct FakeCloud {
    marker: String,
    state: Mutex<CloudState>,
}

impl FakeCloud {
    pub fn new(marker: &str) -> Self {
        Self {
            marker: marker.to_string(),
            state: Mutex::new(CloudState {
                provider: Some(Vec::new()),
                ..Default::default()
            }),
        }
    }

    pub fn set_provider_ips(&self, ips: &[&str]) {
        self.state.lock().unwrap().provider = Some(ips.iter().map(|s| s.to_string()).collect());
    }

    /// Make the provider endpoint fail
    pub fn set_provider_unavailable(&self) {
        self.state.lock().unwrap().provider = None;
    }

    pub fn insert_rule(&self, rule_id: &str, ip: &str, notes: &str) {
        self.state
            .lock()
            .unwrap()
            .rules
            .push(FirewallRule::new(rule_id, ip, notes));
    }

    /// Reject every mutation touching `ip`
    pub fn fail_ip(&self, ip: &str) {
        self.state.lock().unwrap().failing_ips.insert(ip.to_string());
    }

    pub fn rules(&self) -> Vec<FirewallRule> {
        self.state.lock().unwrap().rules.clone()
    }

    pub fn allowed_ips(&self) -> Vec<String> {
        self.rules().into_iter().map(|r| r.ip).collect()
    }

    pub fn deleted_ids(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted.clone()
    }

    /// Number of create/delete calls received
    pub fn mutation_count(&self) -> usize {
        self.state.lock().unwrap().mutations
    }
}

#[async_trait]
impl IpSource for FakeCloud {
    async fn fetch_ips(&self) -> Result<Vec<String>> {
        self.state
            .lock()
            .unwrap()
            .provider
            .clone()
            .ok_or_else(|| SyncError::ProviderUnavailable("fake provider is down".to_string()))
    }
}

#[async_trait]
impl RuleCatalog for FakeCloud {
    async fn read_catalog(&self) -> Catalog {
        let state = self.state.lock().unwrap();
        Catalog::from_rules(&state.rules, &self.marker)
    }

    async fn create_rule(&self, ip: &str, notes: &str) -> MutationOutcome {
        let mut state = self.state.lock().unwrap();
        state.mutations += 1;
        if state.failing_ips.contains(ip) {
            return MutationOutcome::failed(400, "rejected");
        }
        if state.rules.iter().any(|r| r.ip == ip) {
            return MutationOutcome::failed(400, "duplicate of existing rule");
        }
        state.next_id += 1;
        let rule_id = format!("rule-{}", state.next_id);
        state.rules.push(FirewallRule::new(rule_id, ip, notes));
        MutationOutcome::ok(200)
    }

    async fn delete_rule(&self, rule_id: &str) -> MutationOutcome {
        let mut state = self.state.lock().unwrap();
        state.mutations += 1;
        let Some(pos) = state.rules.iter().position(|r| r.rule_id == rule_id) else {
            return MutationOutcome::failed(404, "rule not found");
        };
        if state.failing_ips.contains(&state.rules[pos].ip) {
            return MutationOutcome::failed(400, "rejected");
        }
        state.rules.remove(pos);
        state.deleted.push(rule_id.to_string());
        MutationOutcome::ok(200)
    }
}
