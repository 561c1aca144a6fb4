//! HTTP transport abstraction
//!
//! Every remote call in the sync engine goes through [`HttpTransport`]. A
//! transport never fails: connection errors and timeouts come back as a
//! synthetic [`HttpResponse::TRANSPORT_FAILURE_STATUS`] so callers only ever
//! reason about status codes.

use async_trait::async_trait;
use serde::de::DeserializeOwned;

/// HTTP verbs used against the provider and Cloudflare APIs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Delete => write!(f, "DELETE"),
        }
    }
}

/// Outbound request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(HttpMethod::Post, url).with_body(body)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Look up a header value (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Response as seen by the engine: status plus raw body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// Status reported when the request never produced an HTTP response
    pub const TRANSPORT_FAILURE_STATUS: u16 = 500;

    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn transport_failure() -> Self {
        Self::new(Self::TRANSPORT_FAILURE_STATUS, String::new())
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Decode the body, `None` when it is not valid JSON for `T`
    pub fn json<T: DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Performs one HTTP exchange with a bounded timeout
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> HttpResponse;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let req = HttpRequest::get("https://example.com").with_header("X-Auth-Email", "a@b.c");
        assert_eq!(req.header("x-auth-email"), Some("a@b.c"));
        assert_eq!(req.header("X-Auth-Key"), None);
    }

    #[test]
    fn test_response_json() {
        let ok = HttpResponse::new(200, r#"["1.1.1.1"]"#);
        assert!(ok.is_ok());
        assert_eq!(ok.json::<Vec<String>>(), Some(vec!["1.1.1.1".to_string()]));

        let failure = HttpResponse::transport_failure();
        assert!(!failure.is_ok());
        assert_eq!(failure.status, 500);
        assert_eq!(failure.json::<Vec<String>>(), None);
    }
}
