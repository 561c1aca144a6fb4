//! Interactive mode: one batch per browser request, chained by meta refresh

use crate::context;
use crate::render::Pages;
use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use colored::Colorize;
use qcsync_config::Settings;
use qcsync_core::{BatchRequest, SyncDriver};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct ServeState {
    driver: SyncDriver,
    pages: Pages,
    redirect_delay_secs: u64,
    // One batch at a time, so outbound calls never overlap
    run_lock: Mutex<()>,
}

impl ServeState {
    pub fn new(driver: SyncDriver, redirect_delay_secs: u64) -> tera::Result<Self> {
        Ok(Self {
            driver,
            pages: Pages::new()?,
            redirect_delay_secs,
            run_lock: Mutex::new(()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct BatchQuery {
    batch: Option<String>,
    session: Option<String>,
}

/// Missing, negative or non-numeric values mean "start over"
fn parse_batch(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(0)
}

pub fn router(state: Arc<ServeState>) -> Router {
    Router::new().route("/", get(batch_handler)).with_state(state)
}

async fn batch_handler(
    State(state): State<Arc<ServeState>>,
    Query(query): Query<BatchQuery>,
) -> Response {
    let request = BatchRequest::new(parse_batch(query.batch.as_deref()))
        .with_session(query.session.filter(|s| !s.is_empty()));

    let _guard = state.run_lock.lock().await;
    let page = match state.driver.step(&request).await {
        Ok(step) => state
            .pages
            .batch_page(&step, state.redirect_delay_secs)
            .map(|html| (StatusCode::OK, html)),
        Err(e) => {
            tracing::error!("Batch {} failed: {}", request.batch, e);
            state
                .pages
                .error_page(&e.to_string())
                .map(|html| (StatusCode::INTERNAL_SERVER_ERROR, html))
        }
    };

    match page {
        Ok((status, html)) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Failed to render page: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
        }
    }
}

pub async fn handle(settings: &Settings, bind: Option<String>) -> anyhow::Result<()> {
    let driver = context::build_driver(settings)?;
    let state = Arc::new(ServeState::new(driver, settings.redirect_delay_secs)?);

    let bind = bind.unwrap_or_else(|| settings.bind.clone());
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    let addr = listener.local_addr()?;

    println!("{}", "Interactive sync server started".green().bold());
    println!("  Open {} to begin", format!("http://{}/", addr).cyan());
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use qcsync_core::testing::FakeCloud;
    use tower::ServiceExt;

    const MARKER: &str = "Managed by QUIC.cloud Sync Script";

    fn app(cloud: &Arc<FakeCloud>, driver: impl FnOnce(SyncDriver) -> SyncDriver) -> Router {
        let base = SyncDriver::new(cloud.clone(), cloud.clone(), MARKER)
            .with_date(chrono::NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        router(Arc::new(ServeState::new(driver(base), 2).unwrap()))
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    /// Target of the page's meta refresh, if any
    fn refresh_target(html: &str) -> Option<String> {
        let start = html.find(";url=")? + ";url=".len();
        let end = start + html[start..].find('"')?;
        Some(html[start..end].replace("&amp;", "&"))
    }

    #[test]
    fn test_parse_batch() {
        assert_eq!(parse_batch(None), 0);
        assert_eq!(parse_batch(Some("3")), 3);
        assert_eq!(parse_batch(Some(" 2 ")), 2);
        assert_eq!(parse_batch(Some("abc")), 0);
        assert_eq!(parse_batch(Some("-1")), 0);
        assert_eq!(parse_batch(Some("")), 0);
    }

    #[tokio::test]
    async fn test_nothing_to_do() {
        let cloud = Arc::new(FakeCloud::new(MARKER));
        cloud.set_provider_ips(&["1.1.1.1"]);
        cloud.insert_rule("u1", "1.1.1.1", "office");

        let (status, html) = get(&app(&cloud, |d| d), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("No changes were needed"));
        assert!(refresh_target(&html).is_none());
        assert_eq!(cloud.mutation_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_batch_starts_over() {
        let cloud = Arc::new(FakeCloud::new(MARKER));
        cloud.set_provider_ips(&["1.1.1.1", "2.2.2.2"]);

        let (status, html) = get(&app(&cloud, |d| d), "/?batch=oops").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Found 2 tasks to process across 1 batches."));
        assert_eq!(refresh_target(&html).as_deref(), Some("?batch=1"));
        assert_eq!(cloud.mutation_count(), 0);
    }

    #[tokio::test]
    async fn test_first_batch_applies_jobs() {
        let cloud = Arc::new(FakeCloud::new(MARKER));
        cloud.set_provider_ips(&["1.1.1.1", "2.2.2.2"]);
        cloud.insert_rule("r1", "9.9.9.9", MARKER);

        let (_, html) = get(&app(&cloud, |d| d), "/?batch=1").await;
        assert!(html.contains("Processing Batch 1 of 1..."));
        assert!(html.contains("Removing IP: 9.9.9.9"));
        assert!(html.contains("Adding IP: 2.2.2.2"));
        assert_eq!(refresh_target(&html).as_deref(), Some("?batch=2"));
        assert_eq!(cloud.allowed_ips(), vec!["1.1.1.1", "2.2.2.2"]);

        let (_, html) = get(&app(&cloud, |d| d), "/?batch=2").await;
        assert!(html.contains("All tasks have been processed."));
        assert!(refresh_target(&html).is_none());
    }

    #[tokio::test]
    async fn test_snapshot_session_follows_redirects() {
        let dir = tempfile::tempdir().unwrap();
        let cloud = Arc::new(FakeCloud::new(MARKER));
        let ips: Vec<String> = (1..=12).map(|i| format!("10.0.0.{}", i)).collect();
        let ips: Vec<&str> = ips.iter().map(String::as_str).collect();
        cloud.set_provider_ips(&ips);

        let store = qcsync_core::SnapshotStore::new(dir.path());
        let app = app(&cloud, |d| d.with_snapshots(store));

        let (_, html) = get(&app, "/").await;
        assert!(html.contains("Found 12 tasks to process across 2 batches."));

        let mut pages = 0;
        let mut target = refresh_target(&html);
        while let Some(next) = target {
            assert!(next.contains("session="));
            let (status, html) = get(&app, &format!("/{}", next)).await;
            assert_eq!(status, StatusCode::OK);
            target = refresh_target(&html);
            pages += 1;
            assert!(pages <= 3, "redirect chain did not terminate");
        }

        // Two processed batches and the completion page
        assert_eq!(pages, 3);
        assert_eq!(cloud.allowed_ips().len(), 12);
    }

    #[tokio::test]
    async fn test_snapshot_failure_is_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();

        let cloud = Arc::new(FakeCloud::new(MARKER));
        cloud.set_provider_ips(&["1.1.1.1"]);
        let store = qcsync_core::SnapshotStore::new(&blocker);

        let (status, html) = get(&app(&cloud, |d| d.with_snapshots(store)), "/").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(html.contains("ERROR:"));
    }
}
