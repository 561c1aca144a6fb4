use crate::context;
use colored::Colorize;
use qcsync_config::Settings;
use qcsync_core::{FetchMode, JobAction};

/// Dry run: show what `run` would change
pub async fn handle(settings: &Settings) -> anyhow::Result<()> {
    let driver = context::build_driver(settings)?;

    println!("{}", "Computing sync plan...".blue());
    let snapshot = driver.snapshot(FetchMode::Strict).await?;

    println!(
        "QUIC.cloud IPs: {}, allow rules: {} ({} managed)",
        snapshot.provider_ips.len(),
        snapshot.catalog.all_ips.len(),
        snapshot.catalog.managed.len()
    );

    if !snapshot.plan.has_changes() {
        println!("{}", "✓ No changes needed".green());
        return Ok(());
    }

    println!();
    for job in &snapshot.plan.jobs {
        let symbol = match job.action {
            JobAction::Add => "+".green(),
            JobAction::Remove => "-".red(),
        };
        println!("  {} {}", symbol, job.ip);
    }
    println!();
    println!(
        "Plan: {}, {} batches of {}",
        snapshot.plan.summary(),
        snapshot.plan.batch_count(driver.batch_size()),
        driver.batch_size()
    );

    Ok(())
}
