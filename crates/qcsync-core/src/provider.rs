//! Collaborator traits
//!
//! The engine talks to the outside world only through these traits: an
//! [`IpSource`] publishing the authoritative IP set, a [`RuleCatalog`] owning
//! the firewall allow rules, and a [`CredentialSource`] supplying API
//! credentials.

use crate::catalog::Catalog;
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Source of the IPs that should be allow-listed
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Fetch the published list, de-duplicated, in publication order
    async fn fetch_ips(&self) -> Result<Vec<String>>;
}

/// Firewall allow-rule store
#[async_trait]
pub trait RuleCatalog: Send + Sync {
    /// List every allow rule. Listing problems truncate the result instead
    /// of failing.
    async fn read_catalog(&self) -> Catalog;

    /// Create an allow rule for `ip` with the given notes
    async fn create_rule(&self, ip: &str, notes: &str) -> MutationOutcome;

    /// Delete the allow rule `rule_id`
    async fn delete_rule(&self, rule_id: &str) -> MutationOutcome;
}

/// Result of a create/delete call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationOutcome {
    /// HTTP status (500 for transport failures)
    pub status: u16,

    /// Whether the API accepted the mutation
    pub success: bool,

    /// First API error message, if any
    pub message: Option<String>,
}

impl MutationOutcome {
    pub fn ok(status: u16) -> Self {
        Self {
            status,
            success: true,
            message: None,
        }
    }

    pub fn failed(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            success: false,
            message: Some(message.into()),
        }
    }
}

/// Cloudflare API credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub api_key: String,
    pub zone_id: String,
}

impl Credentials {
    pub fn new(
        email: impl Into<String>,
        api_key: impl Into<String>,
        zone_id: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            api_key: api_key.into(),
            zone_id: zone_id.into(),
        }
    }

    /// Reject blank fields, naming the first one missing
    pub fn validate(self) -> Result<Self> {
        for (name, value) in [
            ("email", &self.email),
            ("api_key", &self.api_key),
            ("zone_id", &self.zone_id),
        ] {
            if value.trim().is_empty() {
                return Err(SyncError::MissingCredential(name.to_string()));
            }
        }
        Ok(self)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("api_key", &"<redacted>")
            .field("zone_id", &self.zone_id)
            .finish()
    }
}

/// Where credentials come from (environment, settings file, ...)
pub trait CredentialSource: Send + Sync {
    fn credentials(&self) -> Result<Credentials>;
}
