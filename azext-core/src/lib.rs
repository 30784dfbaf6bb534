//! Client for publishing Azure VM extension packages through the classic
//! Service Management API.
//!
//! - [`crypto`]: subscription credentials (management certificate)
//! - [`transport`]: certificate-authenticated HTTP exchange
//! - [`wire`]: XML envelopes and the operation id header
//! - [`operations`]: polling of asynchronous operations
//! - [`ExtensionsClient`]: the operations the CLI needs

pub mod client;
pub mod config;
pub mod crypto;
pub mod error;
pub mod operations;
pub mod transport;
pub mod types;
pub mod wire;

pub use client::ExtensionsClient;
pub use config::{ClientConfig, PollSettings};
pub use crypto::Credentials;
pub use error::{ClientError, Result};
pub use operations::{OperationStatusSource, PollState, Poller};
pub use transport::{HttpTransport, ManagementRequest, ManagementResponse, ManagementTransport, Method};
pub use types::{
    CompletedOperation, ExtensionVersionInfo, OperationId, OperationStatus, ReplicationStatusEntry,
};
