use crate::context;
use colored::Colorize;
use qcsync_config::Settings;
use qcsync_core::JobResult;

/// Cron mode: apply every pending job in one pass
pub async fn handle(settings: &Settings) -> anyhow::Result<()> {
    let driver = context::build_driver(settings)?;

    println!("{}", "Fetching IP lists from QUIC.cloud and Cloudflare...".blue());
    let result = driver.run_all(print_progress).await?;

    if result.total() == 0 {
        println!("{}", "✓ No changes needed".green());
        return Ok(());
    }

    println!();
    if result.is_success() {
        println!(
            "{}",
            format!("✓ Sync finished: {} succeeded", result.succeeded.len())
                .green()
                .bold()
        );
    } else {
        println!(
            "{}",
            format!(
                "⚠ Sync finished: {} succeeded, {} failed",
                result.succeeded.len(),
                result.failed.len()
            )
            .yellow()
            .bold()
        );
        for failed in &result.failed {
            println!(
                "  - {} {}",
                failed.job.to_string().cyan(),
                failed.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
    println!("  Elapsed: {}ms", result.duration_ms);

    Ok(())
}

fn print_progress(position: usize, total: usize, result: &JobResult) {
    if position == 1 {
        println!("Processing all {} tasks now...", total);
    }

    let outcome = if result.success {
        "Success.".green()
    } else {
        "Failed.".red()
    };
    println!(
        "[{}/{}] {} IP: {}... {}",
        position,
        total,
        result.job.action.verb(),
        result.job.ip,
        outcome
    );
}
