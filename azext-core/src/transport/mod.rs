//! Request/response seam between the extensions client and the network.
//!
//! [`ManagementTransport`] is the only thing the client needs from the wire:
//! send one request, get one response. [`HttpTransport`] is the real
//! certificate-authenticated implementation; tests plug in stubs.

mod http;

use async_trait::async_trait;

pub use http::HttpTransport;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

/// A request relative to the subscription root.
///
/// Path segments are kept unencoded; the transport escapes them when it
/// builds the final URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagementRequest {
    pub method: Method,
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl ManagementRequest {
    pub fn new<I, S>(method: Method, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method,
            segments: segments.into_iter().map(Into::into).collect(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::Get, segments)
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// `segments` joined with `/`, for log output.
    pub fn path(&self) -> String {
        self.segments.join("/")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagementResponse {
    pub status: u16,
    /// Header names are stored lower-case.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl ManagementResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_ascii_lowercase(), value.into()));
        self
    }

    /// First value of the header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends management requests on behalf of one subscription.
#[async_trait]
pub trait ManagementTransport: Send + Sync {
    /// Perform a single HTTP exchange.
    ///
    /// Only network-level problems are errors here; any HTTP status the
    /// server answers with is returned as a response.
    async fn send(&self, request: ManagementRequest) -> Result<ManagementResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case() {
        let response = ManagementResponse::new(202, "").with_header("X-MS-Request-ID", "op-1");
        assert_eq!(response.header("x-ms-request-id"), Some("op-1"));
        assert_eq!(response.header("X-Ms-Request-Id"), Some("op-1"));
        assert_eq!(response.header("content-type"), None);
    }

    #[test]
    fn success_range() {
        assert!(ManagementResponse::new(200, "").is_success());
        assert!(ManagementResponse::new(202, "").is_success());
        assert!(!ManagementResponse::new(307, "").is_success());
        assert!(!ManagementResponse::new(404, "").is_success());
    }

    #[test]
    fn request_builder_keeps_segments_unencoded() {
        let request = ManagementRequest::get(["sub", "services", "a b"]).query("action", "update");
        assert_eq!(request.path(), "sub/services/a b");
        assert_eq!(request.query, vec![("action".to_string(), "update".to_string())]);
        assert!(request.body.is_none());
    }
}
