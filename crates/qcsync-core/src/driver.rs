//! Batch/resume driver
//!
//! Interactive sessions advance one batch per request:
//!
//! ```text
//! batch=0 (NotStarted) ──jobs?──► Started ──redirect──► batch=1 (InBatch)
//!      │                                                    │
//!      └─no jobs─► NothingToDo            slice non-empty ──┤──► Processed ──redirect──► batch=n+1
//!                                         slice empty ──────┴──► Complete
//! ```
//!
//! Each request rebuilds the job list from live remote state unless a
//! [`SnapshotStore`] is configured. Cron runs skip the state machine and
//! execute the full list in one pass.

use crate::catalog::Catalog;
use crate::error::Result;
use crate::executor::JobExecutor;
use crate::job::{ApplyResult, JobResult, Plan};
use crate::provider::{IpSource, RuleCatalog};
use crate::reconcile;
use crate::state::SnapshotStore;
use chrono::NaiveDate;
use std::sync::Arc;

pub const DEFAULT_BATCH_SIZE: usize = 10;

/// How to react when the provider list cannot be fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Abort the run
    Strict,
    /// Continue with an empty provider list
    Lenient,
}

/// Where an interactive session is, derived from the `batch` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    NotStarted,
    InBatch(u32),
}

impl BatchState {
    pub fn from_index(batch: u32) -> Self {
        match batch {
            0 => BatchState::NotStarted,
            n => BatchState::InBatch(n),
        }
    }
}

/// Parameters carried from one batch request to the next
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchRequest {
    pub batch: u32,
    pub session: Option<String>,
}

impl BatchRequest {
    pub fn new(batch: u32) -> Self {
        Self {
            batch,
            session: None,
        }
    }

    pub fn with_session(mut self, session: Option<String>) -> Self {
        self.session = session;
        self
    }
}

/// What one interactive request did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchStep {
    /// Job list empty on the initial request
    NothingToDo,

    /// Work found; continue with `next`
    Started {
        total_jobs: usize,
        total_batches: usize,
        next: BatchRequest,
    },

    /// One slice executed; continue with `next`
    Processed {
        batch: u32,
        total_batches: usize,
        results: Vec<JobResult>,
        next: BatchRequest,
    },

    /// Slice for `batch` was empty, session finished
    Complete { batch: u32 },
}

impl BatchStep {
    /// Request to redirect to, `None` once terminal
    pub fn next(&self) -> Option<&BatchRequest> {
        match self {
            BatchStep::Started { next, .. } | BatchStep::Processed { next, .. } => Some(next),
            BatchStep::NothingToDo | BatchStep::Complete { .. } => None,
        }
    }
}

/// Fetched remote state and the job list derived from it
#[derive(Debug, Clone)]
pub struct SyncSnapshot {
    pub provider_ips: Vec<String>,
    pub catalog: Catalog,
    pub plan: Plan,
}

/// Drives reconciliation in cron or interactive mode
pub struct SyncDriver {
    source: Arc<dyn IpSource>,
    catalog: Arc<dyn RuleCatalog>,
    marker: String,
    batch_size: usize,
    snapshots: Option<SnapshotStore>,
    date: Option<NaiveDate>,
}

impl SyncDriver {
    pub fn new(
        source: Arc<dyn IpSource>,
        catalog: Arc<dyn RuleCatalog>,
        marker: impl Into<String>,
    ) -> Self {
        Self {
            source,
            catalog,
            marker: marker.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            snapshots: None,
            date: None,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Freeze job lists per session instead of recomputing every batch
    pub fn with_snapshots(mut self, store: SnapshotStore) -> Self {
        self.snapshots = Some(store);
        self
    }

    /// Pin the date written into rule notes
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn today(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    /// Fetch both IP sets and compute the job list
    pub async fn snapshot(&self, mode: FetchMode) -> Result<SyncSnapshot> {
        let provider_ips = match self.source.fetch_ips().await {
            Ok(ips) => ips,
            Err(e) if mode == FetchMode::Lenient => {
                tracing::warn!("Provider IP list unavailable, treating as empty: {}", e);
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        let catalog = self.catalog.read_catalog().await;
        let plan = reconcile::plan(&provider_ips, &catalog);

        tracing::info!(
            "Computed {} jobs ({}) from {} provider IPs and {} allow rules",
            plan.len(),
            plan.summary(),
            provider_ips.len(),
            catalog.all_ips.len()
        );

        Ok(SyncSnapshot {
            provider_ips,
            catalog,
            plan,
        })
    }

    /// Execute every job of `snapshot` in order, reporting each result
    /// as `(position, total, result)`
    async fn execute_plan<F>(&self, snapshot: &SyncSnapshot, mut on_result: F) -> ApplyResult
    where
        F: FnMut(usize, usize, &JobResult),
    {
        let start = std::time::Instant::now();
        let mut result = ApplyResult::new();
        let executor = JobExecutor::new(
            self.catalog.as_ref(),
            &snapshot.catalog.managed,
            &self.marker,
            self.today(),
        );

        let total = snapshot.plan.len();
        for (i, job) in snapshot.plan.jobs.iter().enumerate() {
            let job_result = executor.execute(job).await;
            on_result(i + 1, total, &job_result);
            result.record(job_result);
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        result
    }

    /// Cron mode: compute once and run the whole list.
    /// A provider fetch failure aborts before any mutation.
    pub async fn run_all<F>(&self, on_result: F) -> Result<ApplyResult>
    where
        F: FnMut(usize, usize, &JobResult),
    {
        let snapshot = self.snapshot(FetchMode::Strict).await?;
        Ok(self.execute_plan(&snapshot, on_result).await)
    }

    /// Interactive mode: handle one request of the batch protocol
    pub async fn step(&self, request: &BatchRequest) -> Result<BatchStep> {
        match BatchState::from_index(request.batch) {
            BatchState::NotStarted => self.start().await,
            BatchState::InBatch(n) => self.run_batch(n, request.session.as_deref()).await,
        }
    }

    async fn start(&self) -> Result<BatchStep> {
        let snapshot = self.snapshot(FetchMode::Lenient).await?;
        if snapshot.plan.is_empty() {
            return Ok(BatchStep::NothingToDo);
        }

        let session = match &self.snapshots {
            Some(store) => Some(
                store
                    .create(&snapshot.plan, &snapshot.catalog.managed)
                    .await?
                    .session,
            ),
            None => None,
        };

        Ok(BatchStep::Started {
            total_jobs: snapshot.plan.len(),
            total_batches: snapshot.plan.batch_count(self.batch_size),
            next: BatchRequest::new(1).with_session(session),
        })
    }

    async fn run_batch(&self, batch: u32, session: Option<&str>) -> Result<BatchStep> {
        let frozen = match (&self.snapshots, session) {
            (Some(store), Some(session)) => {
                let loaded = store.load(session).await?;
                if loaded.is_none() {
                    tracing::warn!("Session {} not found, recomputing from live state", session);
                }
                loaded
            }
            _ => None,
        };

        let (plan, managed, session) = match frozen {
            Some(snapshot) => (snapshot.plan, snapshot.managed, Some(snapshot.session)),
            None => {
                let live = self.snapshot(FetchMode::Lenient).await?;
                (live.plan, live.catalog.managed, None)
            }
        };

        let jobs = plan.batch(batch, self.batch_size);
        if jobs.is_empty() {
            if let (Some(store), Some(session)) = (&self.snapshots, session.as_deref()) {
                store.remove(session).await?;
            }
            return Ok(BatchStep::Complete { batch });
        }

        tracing::info!("Processing batch {} ({} jobs)", batch, jobs.len());
        let executor =
            JobExecutor::new(self.catalog.as_ref(), &managed, &self.marker, self.today());
        let mut results = Vec::with_capacity(jobs.len());
        for job in jobs {
            results.push(executor.execute(job).await);
        }

        Ok(BatchStep::Processed {
            batch,
            total_batches: plan.batch_count(self.batch_size),
            results,
            next: BatchRequest::new(batch.saturating_add(1)).with_session(session),
        })
    }
}
