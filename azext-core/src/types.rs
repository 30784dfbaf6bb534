use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

/// Opaque handle of an asynchronous server-side operation.
///
/// Taken verbatim from the `x-ms-request-id` response header; no structure
/// is assumed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationId(String);

impl OperationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for OperationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for OperationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// One published extension version, as listed for the subscription.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExtensionVersionInfo {
    #[serde(rename = "ProviderNameSpace")]
    pub namespace: String,
    #[serde(rename = "Type")]
    pub type_name: String,
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(
        rename = "ReplicationCompleted",
        default,
        deserialize_with = "lenient_bool"
    )]
    pub replication_completed: bool,
    /// Comma-joined region names, exactly as sent by the server.
    #[serde(rename = "Regions", default)]
    pub regions: String,
}

impl ExtensionVersionInfo {
    /// Region names split out of the comma-joined wire value.
    pub fn region_list(&self) -> impl Iterator<Item = &str> {
        self.regions
            .split(',')
            .map(str::trim)
            .filter(|region| !region.is_empty())
    }
}

/// XML boolean as the service writes it: any case, `1`/`0`, and an empty
/// element meaning `false`.
fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let value = raw.trim();
    if value.is_empty() || value == "0" || value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else if value == "1" || value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else {
        Err(serde::de::Error::custom(format!("invalid boolean {value:?}")))
    }
}

/// Replication progress of an extension version in one location.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReplicationStatusEntry {
    #[serde(rename = "Location")]
    pub location: String,
    /// Server-defined status, e.g. `Replicating`, `Completed` or `Failed`.
    #[serde(rename = "Status")]
    pub status: String,
}

impl ReplicationStatusEntry {
    pub fn is_completed(&self) -> bool {
        self.status.eq_ignore_ascii_case("Completed")
    }
}

/// Status reported by the operation status endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    InProgress,
    Succeeded,
    Failed { code: String, message: String },
}

impl OperationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

/// Result of a wait that ended with the operation in `Succeeded`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedOperation {
    pub id: OperationId,
    /// Status queries issued, including failed ones.
    pub queries: u32,
    pub elapsed: Duration,
}
