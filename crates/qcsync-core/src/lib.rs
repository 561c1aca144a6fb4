//! qcsync core
//!
//! Reconciles the IP list published by QUIC.cloud against an allow-rule
//! catalog. The engine fetches both sides, diffs them against the rules it
//! owns (identified by a marker in the rule notes), and applies the resulting
//! jobs either in one pass or in redirect-driven batches.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐
//! │   IpSource   │   │ RuleCatalog  │
//! │ (QUIC.cloud) │   │ (Cloudflare) │
//! └──────┬───────┘   └──────┬───────┘
//!        │                  │
//! ┌──────▼──────────────────▼───────┐
//! │         reconcile::plan         │
//! └───────────────┬─────────────────┘
//!                 │ Plan (removals, then additions)
//! ┌───────────────▼─────────────────┐
//! │ SyncDriver ──► JobExecutor      │
//! │ (cron pass / batch protocol)    │
//! └─────────────────────────────────┘
//! ```

pub mod catalog;
pub mod driver;
pub mod error;
pub mod executor;
pub mod fetcher;
pub mod job;
pub mod provider;
pub mod reconcile;
pub mod state;
pub mod transport;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-exports
pub use catalog::{Catalog, FirewallRule, ManagedRule, is_managed};
pub use driver::{
    BatchRequest, BatchState, BatchStep, DEFAULT_BATCH_SIZE, FetchMode, SyncDriver, SyncSnapshot,
};
pub use error::{Result, SyncError};
pub use executor::{JobExecutor, rule_notes};
pub use fetcher::{QUIC_CLOUD_IPS_URL, QuicCloudFetcher};
pub use job::{ApplyResult, Job, JobAction, JobResult, Plan, PlanSummary};
pub use provider::{CredentialSource, Credentials, IpSource, MutationOutcome, RuleCatalog};
pub use reconcile::compute_jobs;
pub use state::{JobSnapshot, SnapshotStore};
pub use transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
