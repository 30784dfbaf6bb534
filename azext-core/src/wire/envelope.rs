use quick_xml::de::from_str;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::OPERATION_ID_HEADER;
use crate::error::{ClientError, Result};
use crate::transport::ManagementResponse;
use crate::types::{ExtensionVersionInfo, OperationId, OperationStatus, ReplicationStatusEntry};

/// Longest slice of a non-XML error body kept in a [`ClientError::ServiceError`].
const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Debug, Deserialize)]
struct ExtensionImages {
    #[serde(rename = "ExtensionImage", default)]
    images: Vec<ExtensionVersionInfo>,
}

#[derive(Debug, Deserialize)]
struct ReplicationStatusList {
    #[serde(rename = "ReplicationStatus", default)]
    statuses: Vec<ReplicationStatusEntry>,
}

/// `GET /operations/{id}` document.
#[derive(Debug, Deserialize)]
struct OperationDocument {
    #[serde(rename = "Status")]
    status: String,
    #[serde(rename = "Error", default)]
    error: Option<ErrorDocument>,
}

/// Error body shared by failed operations and rejected requests.
#[derive(Debug, Default, Deserialize)]
struct ErrorDocument {
    #[serde(rename = "Code", default)]
    code: String,
    #[serde(rename = "Message", default)]
    message: String,
}

/// Request body for `updateExtension`.
///
/// The manifest is produced elsewhere; it is transmitted byte for byte.
pub fn encode_manifest(manifest: &[u8]) -> Result<Vec<u8>> {
    if manifest.iter().all(u8::is_ascii_whitespace) {
        return Err(ClientError::InvalidArgument(
            "manifest must not be empty".to_string(),
        ));
    }
    Ok(manifest.to_vec())
}

/// Decode the `ExtensionImages` list, keeping server order.
pub fn decode_extension_list(xml: &str) -> Result<Vec<ExtensionVersionInfo>> {
    decode::<ExtensionImages>(xml, "ExtensionImages").map(|list| list.images)
}

/// Decode the `ReplicationStatusList`, keeping server order.
pub fn decode_replication_status(xml: &str) -> Result<Vec<ReplicationStatusEntry>> {
    decode::<ReplicationStatusList>(xml, "ReplicationStatusList").map(|list| list.statuses)
}

pub fn decode_operation_status(xml: &str) -> Result<OperationStatus> {
    let doc = decode::<OperationDocument>(xml, "Operation")?;
    match doc.status.trim() {
        "InProgress" => Ok(OperationStatus::InProgress),
        "Succeeded" => Ok(OperationStatus::Succeeded),
        "Failed" => {
            let error = doc.error.unwrap_or_default();
            Ok(OperationStatus::Failed {
                code: error.code,
                message: error.message,
            })
        }
        other => Err(ClientError::MalformedResponse(format!(
            "unknown operation status {:?}",
            other
        ))),
    }
}

/// Operation id of an accepted mutating request.
pub fn extract_operation_id(response: &ManagementResponse) -> Result<OperationId> {
    response
        .header(OPERATION_ID_HEADER)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(OperationId::from)
        .ok_or(ClientError::MissingOperationId)
}

/// Turn a non-success response into a [`ClientError::ServiceError`].
///
/// The ASM `<Error>` body is used when it parses; otherwise the raw body
/// (shortened) becomes the message.
pub fn service_error(response: &ManagementResponse) -> ClientError {
    match decode::<ErrorDocument>(&response.body, "Error") {
        Ok(doc) => ClientError::ServiceError {
            status: response.status,
            code: doc.code,
            message: doc.message,
        },
        Err(_) => ClientError::ServiceError {
            status: response.status,
            code: "Unknown".to_string(),
            message: response
                .body
                .trim()
                .chars()
                .take(MAX_ERROR_BODY_CHARS)
                .collect(),
        },
    }
}

fn decode<T: DeserializeOwned>(xml: &str, root: &str) -> Result<T> {
    check_document(xml, root)?;
    Ok(from_str::<T>(xml)?)
}

/// Make sure `xml` is one well-formed document whose root element is `root`.
///
/// Done before deserializing so truncated bodies and unrelated documents
/// never yield a partially filled value.
fn check_document(xml: &str, root: &str) -> Result<()> {
    let mut reader = Reader::from_str(xml);
    let mut depth = 0usize;
    let mut root_seen = false;

    loop {
        let event = reader.read_event().map_err(|e| {
            ClientError::MalformedResponse(format!(
                "invalid XML at byte {}: {}",
                reader.buffer_position(),
                e
            ))
        })?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) if depth == 0 => {
                if root_seen {
                    return Err(ClientError::MalformedResponse(
                        "more than one root element".to_string(),
                    ));
                }
                let name = e.local_name();
                if name.as_ref() != root.as_bytes() {
                    return Err(ClientError::MalformedResponse(format!(
                        "expected <{}> document, found <{}>",
                        root,
                        String::from_utf8_lossy(name.as_ref())
                    )));
                }
                root_seen = true;
                if matches!(event, Event::Start(_)) {
                    depth += 1;
                }
            }
            Event::Start(_) => depth += 1,
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Text(ref text) if depth == 0 => {
                if !text.iter().all(u8::is_ascii_whitespace) {
                    return Err(ClientError::MalformedResponse(
                        "text outside the root element".to_string(),
                    ));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !root_seen {
        return Err(ClientError::MalformedResponse(format!(
            "empty response, expected <{}> document",
            root
        )));
    }
    if depth != 0 {
        return Err(ClientError::MalformedResponse(
            "document ended before the root element was closed".to_string(),
        ));
    }
    Ok(())
}
