// Azure Service Management constants

/// Management endpoint for the classic (ASM) control plane
pub const MANAGEMENT_ENDPOINT: &str = "https://management.core.windows.net";

/// API version sent in `x-ms-version` on every request
pub const MANAGEMENT_API_VERSION: &str = "2014-08-01";

/// Header carrying the API version
pub const API_VERSION_HEADER: &str = "x-ms-version";

/// Response header that identifies an asynchronous operation
pub const OPERATION_ID_HEADER: &str = "x-ms-request-id";

/// Content type of every request body
pub const XML_CONTENT_TYPE: &str = "application/xml";

/// Default timeout for a single HTTP exchange, in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Default interval between operation status queries, in seconds
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Default bound on the total time spent waiting for an operation, in seconds
pub const DEFAULT_POLL_DEADLINE_SECS: u64 = 600;

/// Consecutive failed status queries tolerated before giving up
pub const DEFAULT_MAX_QUERY_FAILURES: u32 = 3;
