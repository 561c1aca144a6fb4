//! Wiring from settings to a ready [`SyncDriver`]

use qcsync_cloudflare::{CloudflareAccessRules, ReqwestTransport};
use qcsync_config::{ConfiguredCredentials, Settings};
use qcsync_core::{
    CredentialSource, Credentials, HttpTransport, QuicCloudFetcher, SnapshotStore, SyncDriver,
};
use std::sync::Arc;

/// Resolve credentials and build the driver. Missing credentials fail here,
/// before any network call.
pub fn build_driver(settings: &Settings) -> anyhow::Result<SyncDriver> {
    let credentials = ConfiguredCredentials::new(settings.cloudflare.clone()).credentials()?;
    let transport = Arc::new(ReqwestTransport::new(settings.timeout())?);
    Ok(build_driver_with(settings, credentials, transport))
}

pub fn build_driver_with(
    settings: &Settings,
    credentials: Credentials,
    transport: Arc<dyn HttpTransport>,
) -> SyncDriver {
    let source = Arc::new(QuicCloudFetcher::new(
        transport.clone(),
        &settings.provider_url,
    ));
    let catalog = Arc::new(
        CloudflareAccessRules::new(transport, credentials, &settings.marker)
            .with_api_base(&settings.api_base)
            .with_per_page(settings.per_page),
    );

    let driver = SyncDriver::new(source, catalog, &settings.marker)
        .with_batch_size(settings.batch_size);
    match &settings.snapshot_dir {
        Some(dir) => driver.with_snapshots(SnapshotStore::new(dir)),
        None => driver,
    }
}
