pub mod credentials;
pub mod error;
pub mod settings;

pub use credentials::{ConfiguredCredentials, ENV_API_KEY, ENV_EMAIL, ENV_ZONE_ID};
pub use error::*;
pub use settings::{CloudflareSection, DEFAULT_MARKER, Settings};

use std::path::PathBuf;

/// Environment variable naming the settings file directly
pub const CONFIG_ENV: &str = "QCSYNC_CONFIG";

/// Find the qcsync settings file
///
/// Search order:
/// 1. `QCSYNC_CONFIG` (must exist when set)
/// 2. Current directory: qcsync.local.yaml, qcsync.yaml
/// 3. `./.qcsync/qcsync.yaml`
/// 4. `~/.config/qcsync/config.yaml`
///
/// Returns `Ok(None)` when nothing is found; defaults apply.
pub fn find_config_file() -> Result<Option<PathBuf>> {
    // 1. Explicit path
    if let Ok(config_path) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(Some(path));
        }
        return Err(ConfigError::ConfigFileNotFound(path));
    }

    let current_dir = std::env::current_dir()?;

    // 2. Current directory
    for filename in ["qcsync.local.yaml", "qcsync.yaml"] {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(Some(path));
        }
    }

    // 3. ./.qcsync/
    let local = current_dir.join(".qcsync").join("qcsync.yaml");
    if local.exists() {
        return Ok(Some(local));
    }

    // 4. Global
    if let Some(config_dir) = dirs::config_dir() {
        let global = config_dir.join("qcsync").join("config.yaml");
        if global.exists() {
            return Ok(Some(global));
        }
    }

    Ok(None)
}
