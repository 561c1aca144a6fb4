//! Cloudflare backend for qcsync
//!
//! Implements [`qcsync_core::RuleCatalog`] on top of the zone IP Access Rules
//! API and provides the reqwest transport used for every outbound call.
//!
//! # Example
//!
//! ```ignore
//! use qcsync_cloudflare::{CloudflareAccessRules, ReqwestTransport, DEFAULT_TIMEOUT};
//! use qcsync_core::{Credentials, RuleCatalog};
//! use std::sync::Arc;
//!
//! let transport = Arc::new(ReqwestTransport::new(DEFAULT_TIMEOUT)?);
//! let creds = Credentials::new("ops@example.com", "api-key", "zone-id");
//! let rules = CloudflareAccessRules::new(transport, creds, "Managed by QUIC.cloud Sync Script");
//!
//! let catalog = rules.read_catalog().await;
//! println!("{} managed rules", catalog.managed.len());
//! ```

pub mod access_rules;
pub mod client;
pub mod error;

pub use access_rules::{CLOUDFLARE_API_BASE, CloudflareAccessRules, DEFAULT_PER_PAGE};
pub use client::{DEFAULT_TIMEOUT, ReqwestTransport};
pub use error::{CloudflareError, Result};
