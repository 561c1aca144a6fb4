//! HTML pages for the interactive batch flow

use qcsync_core::{BatchRequest, BatchStep, JobResult};
use serde::Serialize;
use tera::{Context, Tera};

const LAYOUT: &str = "layout.html";
const NOTHING_TO_DO: &str = "nothing_to_do.html";
const STARTED: &str = "started.html";
const PROCESSED: &str = "processed.html";
const COMPLETE: &str = "complete.html";
const ERROR: &str = "error.html";

/// One executed job as shown on a batch page
#[derive(Debug, Serialize)]
struct JobLine<'a> {
    verb: &'a str,
    ip: &'a str,
    success: bool,
    detail: Option<String>,
}

impl<'a> From<&'a JobResult> for JobLine<'a> {
    fn from(result: &'a JobResult) -> Self {
        let detail = match (result.status, result.error.as_deref()) {
            _ if result.success => None,
            (Some(status), Some(error)) => Some(format!("HTTP {}: {}", status, error)),
            (Some(status), None) => Some(format!("HTTP {}", status)),
            (None, Some(error)) => Some(error.to_string()),
            (None, None) => None,
        };
        Self {
            verb: result.job.action.verb(),
            ip: &result.job.ip,
            success: result.success,
            detail,
        }
    }
}

/// Compiled page templates. Every page is autoescaped.
pub struct Pages {
    tera: Tera,
}

impl Pages {
    pub fn new() -> tera::Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (LAYOUT, include_str!("../templates/layout.html")),
            (NOTHING_TO_DO, include_str!("../templates/nothing_to_do.html")),
            (STARTED, include_str!("../templates/started.html")),
            (PROCESSED, include_str!("../templates/processed.html")),
            (COMPLETE, include_str!("../templates/complete.html")),
            (ERROR, include_str!("../templates/error.html")),
        ])?;
        Ok(Self { tera })
    }

    /// Page for one step of the batch protocol. Non-terminal steps carry a
    /// meta refresh to the next request after `delay_secs`.
    pub fn batch_page(&self, step: &BatchStep, delay_secs: u64) -> tera::Result<String> {
        let mut context = Context::new();
        context.insert("delay_secs", &delay_secs);
        context.insert("refresh_url", &step.next().map(next_url));

        let template = match step {
            BatchStep::NothingToDo => NOTHING_TO_DO,
            BatchStep::Started {
                total_jobs,
                total_batches,
                ..
            } => {
                context.insert("total_jobs", total_jobs);
                context.insert("total_batches", total_batches);
                STARTED
            }
            BatchStep::Processed {
                batch,
                total_batches,
                results,
                ..
            } => {
                let lines: Vec<JobLine> = results.iter().map(JobLine::from).collect();
                context.insert("batch", batch);
                context.insert("total_batches", total_batches);
                context.insert("results", &lines);
                PROCESSED
            }
            BatchStep::Complete { .. } => COMPLETE,
        };

        self.tera.render(template, &context)
    }

    /// Page shown when a batch request cannot proceed
    pub fn error_page(&self, message: &str) -> tera::Result<String> {
        let mut context = Context::new();
        context.insert("refresh_url", &None::<String>);
        context.insert("message", message);
        self.tera.render(ERROR, &context)
    }
}

/// Query string for the next request, relative to the current path
fn next_url(next: &BatchRequest) -> String {
    match &next.session {
        Some(session) => format!("?batch={}&session={}", next.batch, session),
        None => format!("?batch={}", next.batch),
    }
}
