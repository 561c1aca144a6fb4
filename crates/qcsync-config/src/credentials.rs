//! Credential sources

use crate::settings::CloudflareSection;
use qcsync_core::{CredentialSource, Credentials, Result, SyncError};

pub const ENV_EMAIL: &str = "CLOUDFLARE_EMAIL";
pub const ENV_API_KEY: &str = "CLOUDFLARE_API_KEY";
pub const ENV_ZONE_ID: &str = "CLOUDFLARE_ZONE_ID";

/// Environment variables layered over the settings file's `cloudflare` block.
/// Blank values count as missing.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredCredentials {
    file: CloudflareSection,
}

impl ConfiguredCredentials {
    pub fn new(file: CloudflareSection) -> Self {
        Self { file }
    }
}

fn resolve(env_var: &str, file_value: Option<&str>, field: &str) -> Result<String> {
    let from_env = std::env::var(env_var).ok().filter(|v| !v.trim().is_empty());
    let from_file = file_value
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string);

    from_env.or(from_file).ok_or_else(|| {
        SyncError::MissingCredential(format!(
            "{} (set {} or cloudflare.{})",
            field, env_var, field
        ))
    })
}

impl CredentialSource for ConfiguredCredentials {
    fn credentials(&self) -> Result<Credentials> {
        let email = resolve(ENV_EMAIL, self.file.email.as_deref(), "email")?;
        let api_key = resolve(ENV_API_KEY, self.file.api_key.as_deref(), "api_key")?;
        let zone_id = resolve(ENV_ZONE_ID, self.file.zone_id.as_deref(), "zone_id")?;
        Credentials::new(email, api_key, zone_id).validate()
    }
}
