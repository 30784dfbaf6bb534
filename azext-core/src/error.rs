//! Error taxonomy for the extensions client.
//!
//! The client never logs and swallows a failure; every method hands one of
//! these variants back to its caller, which decides how fatal it is.

use std::time::Duration;

use thiserror::Error;

use crate::types::OperationId;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// A required parameter was missing or empty. Raised before any request.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The management certificate or its private key could not be used.
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    /// Connection refused, DNS, TLS handshake, request timeout and the like.
    #[error("transport failure: {0}")]
    TransportFailure(String),

    /// The server answered but the payload did not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// A mutating call succeeded without returning an operation id.
    #[error("response did not carry an operation id")]
    MissingOperationId,

    /// The server rejected the request with a non-success HTTP status.
    #[error("service returned HTTP {status}: {code}: {message}")]
    ServiceError {
        status: u16,
        code: String,
        message: String,
    },

    /// The asynchronous operation finished in the `Failed` state.
    #[error("operation {operation_id} failed: {code}: {message}")]
    OperationFailed {
        operation_id: OperationId,
        code: String,
        message: String,
    },

    /// Status queries kept failing until the retry bound was reached.
    #[error("operation {operation_id} status could not be queried after {attempts} attempts: {last}")]
    OperationQueryFailed {
        operation_id: OperationId,
        attempts: u32,
        #[source]
        last: Box<ClientError>,
    },

    #[error("operation {operation_id} did not finish within {elapsed:?}")]
    OperationTimedOut {
        operation_id: OperationId,
        elapsed: Duration,
    },

    #[error("waiting for operation {operation_id} was cancelled")]
    OperationCancelled { operation_id: OperationId },
}

impl ClientError {
    /// Whether a status query that failed this way may simply be repeated.
    ///
    /// Network failures, unreadable payloads, throttling and server-side
    /// (5xx) errors are transient; everything else reflects a request the
    /// server will keep rejecting.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::TransportFailure(_) | Self::MalformedResponse(_) => true,
            Self::ServiceError { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// The operation id this error refers to, when there is one.
    pub fn operation_id(&self) -> Option<&OperationId> {
        match self {
            Self::OperationFailed { operation_id, .. }
            | Self::OperationQueryFailed { operation_id, .. }
            | Self::OperationTimedOut { operation_id, .. }
            | Self::OperationCancelled { operation_id } => Some(operation_id),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::TransportFailure(format!("request timed out: {}", e))
        } else if e.is_connect() {
            Self::TransportFailure(format!("connection failed: {}", e))
        } else {
            Self::TransportFailure(e.to_string())
        }
    }
}

impl From<quick_xml::DeError> for ClientError {
    fn from(e: quick_xml::DeError) -> Self {
        Self::MalformedResponse(e.to_string())
    }
}
