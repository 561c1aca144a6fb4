//! Cloudflare catalog error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CloudflareError {
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, CloudflareError>;
