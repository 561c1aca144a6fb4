//! Job-list snapshots for exactly-once batch slicing
//!
//! By default every batch request recomputes the job list from live remote
//! state. When a snapshot directory is configured, the list computed at the
//! start of an interactive session is frozen under
//! `<dir>/<session>.json` and later batches slice that frozen list instead.

use crate::catalog::ManagedRule;
use crate::error::{Result, SyncError};
use crate::job::Plan;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

const SNAPSHOT_VERSION: u32 = 1;
const SNAPSHOT_TTL_HOURS: i64 = 1;

/// Frozen job list for one interactive session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSnapshot {
    /// Snapshot file version
    pub version: u32,

    /// Session token carried in the redirect URL
    pub session: String,

    pub created_at: DateTime<Utc>,

    /// Job list as computed when the session started
    pub plan: Plan,

    /// Managed rules used to resolve remove jobs
    pub managed: Vec<ManagedRule>,
}

/// Only the field the expiry sweep needs
#[derive(Deserialize)]
struct SnapshotAge {
    created_at: DateTime<Utc>,
}

fn is_expired(created_at: DateTime<Utc>) -> bool {
    Utc::now().signed_duration_since(created_at).num_hours() >= SNAPSHOT_TTL_HOURS
}

/// Reads and writes session snapshots
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Snapshot path, `None` unless the token is a UUID
    fn snapshot_path(&self, session: &str) -> Option<PathBuf> {
        let id = Uuid::parse_str(session).ok()?;
        Some(self.dir.join(format!("{}.json", id.hyphenated())))
    }

    async fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).await?;
            tracing::debug!("Created snapshot directory: {}", self.dir.display());
        }
        Ok(())
    }

    /// Delete expired snapshots left behind by abandoned sessions.
    /// Files that are not snapshots, or cannot be read, are left alone.
    async fn sweep_expired(&self) -> usize {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Cannot scan snapshot directory {}: {}", self.dir.display(), e);
                return 0;
            }
        };

        let mut removed = 0;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            let is_snapshot = path.extension().is_some_and(|ext| ext == "json")
                && path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .is_some_and(|stem| Uuid::parse_str(stem).is_ok());
            if !is_snapshot {
                continue;
            }

            let Ok(content) = fs::read_to_string(&path).await else {
                continue;
            };
            let expired = serde_json::from_str::<SnapshotAge>(&content)
                .is_ok_and(|snapshot| is_expired(snapshot.created_at));
            if !expired {
                continue;
            }

            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
            }
        }

        if removed > 0 {
            tracing::debug!("Swept {} expired snapshots", removed);
        }
        removed
    }

    /// Freeze `plan` under a new session token
    pub async fn create(&self, plan: &Plan, managed: &[ManagedRule]) -> Result<JobSnapshot> {
        self.ensure_dir().await?;
        self.sweep_expired().await;

        let snapshot = JobSnapshot {
            version: SNAPSHOT_VERSION,
            session: Uuid::new_v4().hyphenated().to_string(),
            created_at: Utc::now(),
            plan: plan.clone(),
            managed: managed.to_vec(),
        };
        let path = self
            .snapshot_path(&snapshot.session)
            .ok_or_else(|| SyncError::SnapshotError("generated invalid session".to_string()))?;

        let content = serde_json::to_string_pretty(&snapshot)?;
        fs::write(&path, content).await?;

        tracing::debug!(
            "Saved snapshot {} with {} jobs",
            snapshot.session,
            snapshot.plan.len()
        );
        Ok(snapshot)
    }

    /// Load a session. Unknown, malformed, and expired tokens yield `None`.
    pub async fn load(&self, session: &str) -> Result<Option<JobSnapshot>> {
        let Some(path) = self.snapshot_path(session) else {
            tracing::debug!("Ignoring malformed session token");
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await?;
        let snapshot: JobSnapshot = serde_json::from_str(&content)?;

        if snapshot.version > SNAPSHOT_VERSION {
            return Err(SyncError::SnapshotError(format!(
                "Snapshot version {} is newer than supported version {}",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }

        if is_expired(snapshot.created_at) {
            tracing::warn!("Discarding expired snapshot {}", snapshot.session);
            fs::remove_file(&path).await?;
            return Ok(None);
        }

        Ok(Some(snapshot))
    }

    pub async fn remove(&self, session: &str) -> Result<()> {
        let Some(path) = self.snapshot_path(session) else {
            return Ok(());
        };
        if path.exists() {
            fs::remove_file(&path).await?;
            tracing::debug!("Removed snapshot {}", session);
        }
        Ok(())
    }
}
