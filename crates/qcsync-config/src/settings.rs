//! Runtime settings

use crate::error::{ConfigError, Result};
use qcsync_cloudflare::{CLOUDFLARE_API_BASE, DEFAULT_PER_PAGE, DEFAULT_TIMEOUT};
use qcsync_core::{DEFAULT_BATCH_SIZE, QUIC_CLOUD_IPS_URL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_MARKER: &str = "Managed by QUIC.cloud Sync Script";
pub const DEFAULT_REDIRECT_DELAY_SECS: u64 = 2;
pub const DEFAULT_BIND: &str = "127.0.0.1:8787";

/// Settings file contents. Every field has a default, so an empty file (or
/// no file at all) is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// QUIC.cloud IP list endpoint
    pub provider_url: String,

    /// Cloudflare API v4 base URL
    pub api_base: String,

    /// Substring identifying rules this tool owns
    pub marker: String,

    /// Jobs per interactive batch
    pub batch_size: usize,

    /// Seconds before the browser follows the next-batch redirect
    pub redirect_delay_secs: u64,

    /// Page size for access rule listing
    pub per_page: u32,

    /// Timeout for every outbound HTTP call
    pub timeout_secs: u64,

    /// Freeze interactive job lists here (disabled when unset)
    pub snapshot_dir: Option<PathBuf>,

    /// Listen address for `qcsync serve`
    pub bind: String,

    pub cloudflare: CloudflareSection,
}

/// Credentials block; environment variables take precedence per field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CloudflareSection {
    pub email: Option<String>,
    pub api_key: Option<String>,
    pub zone_id: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider_url: QUIC_CLOUD_IPS_URL.to_string(),
            api_base: CLOUDFLARE_API_BASE.to_string(),
            marker: DEFAULT_MARKER.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            redirect_delay_secs: DEFAULT_REDIRECT_DELAY_SECS,
            per_page: DEFAULT_PER_PAGE,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            snapshot_dir: None,
            bind: DEFAULT_BIND.to_string(),
            cloudflare: CloudflareSection::default(),
        }
    }
}

impl Settings {
    /// Parse and validate a YAML settings file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::ConfigFileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_yaml(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        tracing::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings: Settings = if content.trim().is_empty() {
            Settings::default()
        } else {
            serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
                path: PathBuf::new(),
                source,
            })?
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Load from an explicit path, or discover one, or fall back to defaults
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => crate::find_config_file()?,
        };
        match path {
            Some(path) => Ok((Self::from_file(&path)?, Some(path))),
            None => {
                tracing::debug!("No settings file found, using defaults");
                Ok((Self::default(), None))
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.marker.trim().is_empty() {
            return Err(ConfigError::Invalid("marker must not be empty".to_string()));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be at least 1".to_string()));
        }
        if self.per_page == 0 {
            return Err(ConfigError::Invalid("per_page must be at least 1".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be at least 1".to_string()));
        }
        for (name, url) in [("provider_url", &self.provider_url), ("api_base", &self.api_base)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be an http(s) URL: {}",
                    name, url
                )));
            }
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.provider_url, "https://quic.cloud/ips?json");
        assert_eq!(settings.api_base, "https://api.cloudflare.com/client/v4");
        assert_eq!(settings.batch_size, 10);
        assert_eq!(settings.redirect_delay_secs, 2);
        assert_eq!(settings.per_page, 100);
        assert_eq!(settings.timeout(), Duration::from_secs(45));
        assert!(settings.snapshot_dir.is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let settings = Settings::from_yaml(
            "batch_size: 25\ncloudflare:\n  email: ops@example.com\n  zone_id: abc\n",
        )
        .unwrap();
        assert_eq!(settings.batch_size, 25);
        assert_eq!(settings.marker, DEFAULT_MARKER);
        assert_eq!(settings.cloudflare.email.as_deref(), Some("ops@example.com"));
        assert_eq!(settings.cloudflare.api_key, None);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(Settings::from_yaml("").unwrap(), Settings::default());
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(
            Settings::from_yaml("marker: ''"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Settings::from_yaml("batch_size: 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Settings::from_yaml("api_base: ftp://example.com"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Settings::from_yaml("batchsize: 3"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_from_file_missing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("nope.yaml");
        assert!(matches!(
            Settings::from_file(&missing),
            Err(ConfigError::ConfigFileNotFound(_))
        ));
    }

    #[test]
    fn test_from_file_reports_path_on_parse_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("qcsync.yaml");
        std::fs::write(&path, "batch_size: [1, 2]").unwrap();

        let err = Settings::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("qcsync.yaml"));
    }
}
