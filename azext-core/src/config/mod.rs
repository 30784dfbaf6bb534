//! Client configuration.
//!
//! Every tunable has a default in [`constants`]; callers override individual
//! values with the `with_*` setters and the result is checked once by
//! [`ClientConfig::validate`] when a client is built.

mod constants;

use std::time::Duration;

pub use constants::*;

use crate::error::{ClientError, Result};

/// Timing knobs for [`crate::operations::Poller`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Pause between two status queries.
    pub interval: Duration,
    /// Upper bound on the whole wait, measured from the first query.
    pub deadline: Duration,
    /// Number of consecutive failed queries after which the wait is abandoned.
    pub max_query_failures: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            deadline: Duration::from_secs(DEFAULT_POLL_DEADLINE_SECS),
            max_query_failures: DEFAULT_MAX_QUERY_FAILURES,
        }
    }
}

impl PollSettings {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_max_query_failures(mut self, max_query_failures: u32) -> Self {
        self.max_query_failures = max_query_failures;
        self
    }

    /// Reject settings that would spin or never give up on failures.
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(ClientError::InvalidArgument(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        if self.max_query_failures == 0 {
            return Err(ClientError::InvalidArgument(
                "max query failures must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings for [`crate::ExtensionsClient`] and its HTTP transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the management API; the subscription id is appended to it.
    pub endpoint: String,
    /// Value of the `x-ms-version` header.
    pub api_version: String,
    /// Timeout applied to every individual HTTP exchange.
    pub request_timeout: Duration,
    pub poll: PollSettings,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: MANAGEMENT_ENDPOINT.to_string(),
            api_version: MANAGEMENT_API_VERSION.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            poll: PollSettings::default(),
        }
    }
}

impl ClientConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_poll_settings(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    /// Check the configuration before any connection is made.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidArgument`] for an unparsable or non-HTTP
    /// endpoint, an empty API version, a zero request timeout or invalid
    /// [`PollSettings`].
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.endpoint).map_err(|e| {
            ClientError::InvalidArgument(format!("invalid endpoint {}: {}", self.endpoint, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
            return Err(ClientError::InvalidArgument(format!(
                "endpoint must be an http(s) base URL, got {}",
                self.endpoint
            )));
        }
        if self.api_version.trim().is_empty() {
            return Err(ClientError::InvalidArgument(
                "api version must not be empty".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(ClientError::InvalidArgument(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        self.poll.validate()
    }
}
