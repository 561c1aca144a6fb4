//! Job types for allow-list reconciliation

use serde::{Deserialize, Serialize};

/// One pending mutation of the allow list
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Job {
    /// Type of mutation
    pub action: JobAction,

    /// IP the mutation applies to
    pub ip: String,
}

impl Job {
    pub fn add(ip: impl Into<String>) -> Self {
        Self {
            action: JobAction::Add,
            ip: ip.into(),
        }
    }

    pub fn remove(ip: impl Into<String>) -> Self {
        Self {
            action: JobAction::Remove,
            ip: ip.into(),
        }
    }
}

impl std::fmt::Display for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.action, self.ip)
    }
}

/// Type of mutation to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobAction {
    /// Create a managed allow rule
    Add,
    /// Delete a managed allow rule
    Remove,
}

impl JobAction {
    /// Progressive verb for status lines ("Adding", "Removing")
    pub fn verb(&self) -> &'static str {
        match self {
            JobAction::Add => "Adding",
            JobAction::Remove => "Removing",
        }
    }
}

impl std::fmt::Display for JobAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobAction::Add => write!(f, "add"),
            JobAction::Remove => write!(f, "remove"),
        }
    }
}

/// Outcome of executing a single job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    /// The job that ran
    pub job: Job,

    /// Whether the mutation was accepted
    pub success: bool,

    /// HTTP status, `None` when no request was sent
    pub status: Option<u16>,

    /// Error message if failed
    pub error: Option<String>,
}

impl JobResult {
    pub fn succeeded(job: Job, status: u16) -> Self {
        Self {
            job,
            success: true,
            status: Some(status),
            error: None,
        }
    }

    pub fn failed(job: Job, status: Option<u16>, error: impl Into<String>) -> Self {
        Self {
            job,
            success: false,
            status,
            error: Some(error.into()),
        }
    }
}

/// Aggregate of a run over many jobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyResult {
    /// Successfully applied jobs
    pub succeeded: Vec<JobResult>,

    /// Failed jobs
    pub failed: Vec<JobResult>,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl ApplyResult {
    pub fn new() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
            duration_ms: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn record(&mut self, result: JobResult) {
        if result.success {
            self.succeeded.push(result);
        } else {
            self.failed.push(result);
        }
    }
}

impl Default for ApplyResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Ordered job list computed for one invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Removals first, then additions
    pub jobs: Vec<Job>,
}

impl Plan {
    pub fn new(jobs: Vec<Job>) -> Self {
        Self { jobs }
    }

    pub fn has_changes(&self) -> bool {
        !self.jobs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Get jobs by action
    pub fn jobs_by_action(&self, action: JobAction) -> Vec<&Job> {
        self.jobs.iter().filter(|j| j.action == action).collect()
    }

    /// Number of chunks of `batch_size` needed to cover every job
    pub fn batch_count(&self, batch_size: usize) -> usize {
        if batch_size == 0 {
            return 0;
        }
        self.jobs.len().div_ceil(batch_size)
    }

    /// Jobs for 1-based batch `index`.
    ///
    /// Index 0 and indices past the last chunk yield an empty slice.
    pub fn batch(&self, index: u32, batch_size: usize) -> &[Job] {
        if index == 0 || batch_size == 0 {
            return &[];
        }
        let start = (index as usize - 1).saturating_mul(batch_size);
        if start >= self.jobs.len() {
            return &[];
        }
        let end = start.saturating_add(batch_size).min(self.jobs.len());
        &self.jobs[start..end]
    }

    /// Summary of the plan
    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            add: self.jobs_by_action(JobAction::Add).len(),
            remove: self.jobs_by_action(JobAction::Remove).len(),
        }
    }
}

/// Summary of planned jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanSummary {
    pub add: usize,
    pub remove: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to add, {} to remove", self.add, self.remove)
    }
}
