//! Allow-list diff
//!
//! Removals only ever target rules this tool created; additions skip any IP
//! that is already allowed, whoever added it. Removals come first so the
//! allow list never grows past its final size mid-run.

use crate::catalog::{Catalog, ManagedRule};
use crate::job::{Job, Plan};
use std::collections::HashSet;

/// Compute the ordered job list.
///
/// - removals: managed IPs absent from `provider_ips`, one per distinct IP,
///   in managed-list order
/// - additions: provider IPs absent from `all_ips`, in provider order
pub fn compute_jobs(
    provider_ips: &[String],
    all_ips: &[String],
    managed: &[ManagedRule],
) -> Vec<Job> {
    let provider: HashSet<&str> = provider_ips.iter().map(String::as_str).collect();
    let allowed: HashSet<&str> = all_ips.iter().map(String::as_str).collect();

    let mut jobs = Vec::new();

    let mut queued = HashSet::new();
    for rule in managed {
        let ip = rule.ip.as_str();
        if !provider.contains(ip) && queued.insert(ip) {
            jobs.push(Job::remove(ip));
        }
    }

    let mut queued = HashSet::new();
    for ip in provider_ips {
        let ip = ip.as_str();
        if !allowed.contains(ip) && queued.insert(ip) {
            jobs.push(Job::add(ip));
        }
    }

    jobs
}

/// Build a [`Plan`] from the provider list and a catalog listing
pub fn plan(provider_ips: &[String], catalog: &Catalog) -> Plan {
    Plan::new(compute_jobs(provider_ips, &catalog.all_ips, &catalog.managed))
}
