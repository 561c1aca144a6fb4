//! Applies single jobs against a rule catalog

use crate::catalog::{ManagedRule, rule_id_for};
use crate::job::{Job, JobAction, JobResult};
use crate::provider::{MutationOutcome, RuleCatalog};
use chrono::NaiveDate;

/// Notes attached to every rule this tool creates
pub fn rule_notes(marker: &str, date: NaiveDate) -> String {
    format!("{} | Added on {}", marker, date.format("%Y-%m-%d"))
}

/// Executes jobs one at a time. Remove jobs resolve their rule id from the
/// managed list captured when the job list was computed.
pub struct JobExecutor<'a> {
    catalog: &'a dyn RuleCatalog,
    managed: &'a [ManagedRule],
    marker: &'a str,
    date: NaiveDate,
}

impl<'a> JobExecutor<'a> {
    pub fn new(
        catalog: &'a dyn RuleCatalog,
        managed: &'a [ManagedRule],
        marker: &'a str,
        date: NaiveDate,
    ) -> Self {
        Self {
            catalog,
            managed,
            marker,
            date,
        }
    }

    pub async fn execute(&self, job: &Job) -> JobResult {
        match job.action {
            JobAction::Add => {
                let notes = rule_notes(self.marker, self.date);
                tracing::info!("Adding allow rule for {}", job.ip);
                let outcome = self.catalog.create_rule(&job.ip, &notes).await;
                into_result(job, outcome)
            }
            JobAction::Remove => {
                let Some(rule_id) = rule_id_for(self.managed, &job.ip) else {
                    tracing::warn!("No managed rule id for {}, skipping delete", job.ip);
                    return JobResult::failed(job.clone(), None, "no managed rule id for IP");
                };
                tracing::info!("Removing allow rule {} ({})", rule_id, job.ip);
                let outcome = self.catalog.delete_rule(rule_id).await;
                into_result(job, outcome)
            }
        }
    }
}

fn into_result(job: &Job, outcome: MutationOutcome) -> JobResult {
    if outcome.success {
        JobResult::succeeded(job.clone(), outcome.status)
    } else {
        let message = outcome
            .message
            .unwrap_or_else(|| format!("HTTP {}", outcome.status));
        tracing::warn!("{} failed: {}", job, message);
        JobResult::failed(job.clone(), Some(outcome.status), message)
    }
}
