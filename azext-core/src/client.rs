use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::ClientConfig;
use crate::crypto::Credentials;
use crate::error::{ClientError, Result};
use crate::operations::{OperationStatusSource, Poller};
use crate::transport::{HttpTransport, ManagementRequest, ManagementResponse, ManagementTransport, Method};
use crate::types::{
    CompletedOperation, ExtensionVersionInfo, OperationId, OperationStatus, ReplicationStatusEntry,
};
use crate::wire;

/// Publisher-side operations on VM extension packages.
///
/// Reads (`list_versions`, `get_replication_status`) answer directly.
/// Writes (`update_extension`, `delete_extension`) only start an operation
/// and return its id; pass that id to [`ExtensionsClient::wait_for_operation`]
/// to learn how it ended.
///
/// Every string argument is checked before anything is sent, so an empty
/// value fails with [`ClientError::InvalidArgument`] without a round trip.
#[derive(Debug)]
pub struct ExtensionsClient<T = HttpTransport> {
    transport: T,
    poller: Poller,
}

impl ExtensionsClient<HttpTransport> {
    /// Connect to the management endpoint with the subscription's certificate.
    ///
    /// # Errors
    ///
    /// [`ClientError::InvalidArgument`] for an invalid configuration and
    /// [`ClientError::InvalidCertificate`] when the TLS client cannot use the
    /// certificate.
    pub fn new(credentials: &Credentials, config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(credentials, &config)?;
        Ok(Self {
            transport,
            poller: Poller::new(config.poll),
        })
    }
}

impl<T: ManagementTransport> ExtensionsClient<T> {
    /// Use a custom transport, e.g. a stub in tests.
    pub fn with_transport(transport: T, config: ClientConfig) -> Result<Self> {
        config.poll.validate()?;
        Ok(Self {
            transport,
            poller: Poller::new(config.poll),
        })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// All extension versions published by the subscription, in server order.
    pub async fn list_versions(&self) -> Result<Vec<ExtensionVersionInfo>> {
        let response = self
            .fetch(ManagementRequest::get(["services", "publisherextensions"]))
            .await?;
        let versions = wire::decode_extension_list(&response.body)?;
        debug!(count = versions.len(), "Listed extension versions");
        Ok(versions)
    }

    /// Per-location replication status of one version, in server order.
    pub async fn get_replication_status(
        &self,
        namespace: &str,
        name: &str,
        version: &str,
    ) -> Result<Vec<ReplicationStatusEntry>> {
        require("namespace", namespace)?;
        require("name", name)?;
        require("version", version)?;

        let response = self
            .fetch(ManagementRequest::get([
                "services",
                "extensions",
                namespace,
                name,
                version,
                "replicationstatus",
            ]))
            .await?;
        wire::decode_replication_status(&response.body)
    }

    /// Submit an extension manifest.
    ///
    /// Publishing, updating and unpublishing all go through here; the
    /// manifest content decides which one happens.
    pub async fn update_extension(&self, manifest: &[u8]) -> Result<OperationId> {
        let body = wire::encode_manifest(manifest)?;
        let request = ManagementRequest::new(Method::Put, ["services", "extensions"])
            .query("action", "update")
            .body(body);
        let response = self.fetch(request).await?;
        let id = wire::extract_operation_id(&response)?;
        debug!(operation_id = %id, "Extension update accepted");
        Ok(id)
    }

    /// Delete one extension version. It should be unpublished first.
    pub async fn delete_extension(
        &self,
        namespace: &str,
        name: &str,
        version: &str,
    ) -> Result<OperationId> {
        require("namespace", namespace)?;
        require("name", name)?;
        require("version", version)?;

        let request = ManagementRequest::new(
            Method::Delete,
            ["services", "extensions", namespace, name, version],
        );
        let response = self.fetch(request).await?;
        let id = wire::extract_operation_id(&response)?;
        debug!(operation_id = %id, "Extension delete accepted");
        Ok(id)
    }

    /// One status query, without waiting.
    pub async fn get_operation_status(&self, id: &OperationId) -> Result<OperationStatus> {
        require("operation id", id.as_str())?;
        let response = self
            .fetch(ManagementRequest::get(["operations", id.as_str()]))
            .await?;
        wire::decode_operation_status(&response.body)
    }

    /// Wait for `id` with the configured interval and deadline.
    pub async fn wait_for_operation(&self, id: &OperationId) -> Result<CompletedOperation> {
        self.wait_for_operation_with_cancel(id, &CancellationToken::new())
            .await
    }

    /// Like [`Self::wait_for_operation`], giving up early once `cancel` fires.
    pub async fn wait_for_operation_with_cancel(
        &self,
        id: &OperationId,
        cancel: &CancellationToken,
    ) -> Result<CompletedOperation> {
        self.poller.wait(self, id, cancel).await
    }

    async fn fetch(&self, request: ManagementRequest) -> Result<ManagementResponse> {
        let method = request.method;
        let path = request.path();
        let response = self.transport.send(request).await?;
        debug!(
            method = method.as_str(),
            path = %path,
            status = response.status,
            "Management request completed"
        );
        if response.is_success() {
            Ok(response)
        } else {
            Err(wire::service_error(&response))
        }
    }
}

#[async_trait]
impl<T: ManagementTransport> OperationStatusSource for ExtensionsClient<T> {
    async fn query_status(&self, id: &OperationId) -> Result<OperationStatus> {
        self.get_operation_status(id).await
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ClientError::InvalidArgument(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::config::PollSettings;

    /// Records every request and answers from a queue of canned replies.
    #[derive(Default)]
    struct StubTransport {
        replies: Mutex<VecDeque<Result<ManagementResponse>>>,
        requests: Mutex<Vec<ManagementRequest>>,
    }

    impl StubTransport {
        fn replying(replies: Vec<Result<ManagementResponse>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::default(),
            }
        }

        fn requests(&self) -> Vec<ManagementRequest> {
            self.requests.lock().unwrap().clone()
        }

        fn count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ManagementTransport for StubTransport {
        async fn send(&self, request: ManagementRequest) -> Result<ManagementResponse> {
            self.requests.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ClientError::TransportFailure("no reply scripted".to_string())))
        }
    }

    fn client(replies: Vec<Result<ManagementResponse>>) -> ExtensionsClient<StubTransport> {
        let config = ClientConfig::default().with_poll_settings(
            PollSettings::default()
                .with_interval(Duration::from_secs(1))
                .with_deadline(Duration::from_secs(30)),
        );
        ExtensionsClient::with_transport(StubTransport::replying(replies), config).unwrap()
    }

    fn ok(body: &str) -> Result<ManagementResponse> {
        Ok(ManagementResponse::new(200, body))
    }

    fn accepted(operation_id: &str) -> Result<ManagementResponse> {
        Ok(ManagementResponse::new(202, "").with_header("x-ms-request-id", operation_id))
    }

    fn operation(status: &str) -> Result<ManagementResponse> {
        ok(&format!(
            "<Operation xmlns=\"http://schemas.microsoft.com/windowsazure\"><ID>op</ID><Status>{}</Status></Operation>",
            status
        ))
    }

    #[tokio::test]
    async fn empty_arguments_never_reach_the_network() {
        let client = client(vec![]);

        let blanks = [("", "name", "1.0"), ("Ns", "", "1.0"), ("Ns", "name", " ")];
        for (namespace, name, version) in blanks {
            assert!(matches!(
                client.get_replication_status(namespace, name, version).await,
                Err(ClientError::InvalidArgument(_))
            ));
            assert!(matches!(
                client.delete_extension(namespace, name, version).await,
                Err(ClientError::InvalidArgument(_))
            ));
        }
        assert!(matches!(
            client.update_extension(b"").await,
            Err(ClientError::InvalidArgument(_))
        ));
        assert!(matches!(
            client.get_operation_status(&OperationId::new("")).await,
            Err(ClientError::InvalidArgument(_))
        ));
        assert!(matches!(
            client.wait_for_operation(&OperationId::new("")).await,
            Err(ClientError::InvalidArgument(_))
        ));

        assert_eq!(client.transport().count(), 0);
    }

    #[tokio::test]
    async fn list_versions_preserves_server_order() {
        let client = client(vec![ok("<ExtensionImages>\
            <ExtensionImage><ProviderNameSpace>Ns</ProviderNameSpace><Type>B</Type><Version>2.0</Version></ExtensionImage>\
            <ExtensionImage><ProviderNameSpace>Ns</ProviderNameSpace><Type>A</Type><Version>1.0</Version></ExtensionImage>\
            </ExtensionImages>")]);

        let versions = client.list_versions().await.unwrap();
        let names: Vec<&str> = versions.iter().map(|v| v.type_name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);

        let requests = client.transport().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Get);
        assert_eq!(requests[0].path(), "services/publisherextensions");
    }

    #[tokio::test]
    async fn replication_status_request_shape() {
        let client = client(vec![ok("<ReplicationStatusList>\
            <ReplicationStatus><Location>West US</Location><Status>Completed</Status></ReplicationStatus>\
            </ReplicationStatusList>")]);

        let statuses = client
            .get_replication_status("Microsoft.Azure.Extensions", "CustomScript", "2.0.1")
            .await
            .unwrap();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].location, "West US");

        let requests = client.transport().requests();
        assert_eq!(
            requests[0].path(),
            "services/extensions/Microsoft.Azure.Extensions/CustomScript/2.0.1/replicationstatus"
        );
    }

    #[tokio::test]
    async fn update_sends_manifest_verbatim_and_returns_operation_id() {
        let client = client(vec![accepted("5f0c-opaque")]);
        let manifest = b"<ExtensionImage><Type>CustomScript</Type></ExtensionImage>";

        let id = client.update_extension(manifest).await.unwrap();
        assert_eq!(id.as_str(), "5f0c-opaque");

        let requests = client.transport().requests();
        assert_eq!(requests[0].method, Method::Put);
        assert_eq!(requests[0].path(), "services/extensions");
        assert_eq!(
            requests[0].query,
            vec![("action".to_string(), "update".to_string())]
        );
        assert_eq!(requests[0].body.as_deref(), Some(&manifest[..]));
    }

    #[tokio::test]
    async fn update_without_operation_id_header_fails() {
        let client = client(vec![Ok(ManagementResponse::new(202, ""))]);
        let err = client.update_extension(b"<ExtensionImage/>").await.unwrap_err();
        assert!(matches!(err, ClientError::MissingOperationId));
    }

    #[tokio::test]
    async fn delete_request_shape() {
        let client = client(vec![accepted("del-1")]);
        let id = client
            .delete_extension("Ns", "Name", "1.0.0")
            .await
            .unwrap();
        assert_eq!(id, OperationId::new("del-1"));

        let requests = client.transport().requests();
        assert_eq!(requests[0].method, Method::Delete);
        assert_eq!(requests[0].path(), "services/extensions/Ns/Name/1.0.0");
        assert!(requests[0].body.is_none());
    }

    #[tokio::test]
    async fn rejected_request_becomes_service_error() {
        let client = client(vec![Ok(ManagementResponse::new(
            409,
            "<Error><Code>ConflictError</Code><Message>Unpublish the version first.</Message></Error>",
        ))]);
        let err = client.delete_extension("Ns", "Name", "1.0").await.unwrap_err();
        match err {
            ClientError::ServiceError {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 409);
                assert_eq!(code, "ConflictError");
                assert_eq!(message, "Unpublish the version first.");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn one_shot_calls_do_not_retry() {
        let client = client(vec![Err(ClientError::TransportFailure(
            "connection refused".to_string(),
        ))]);
        let err = client.list_versions().await.unwrap_err();
        assert!(matches!(err, ClientError::TransportFailure(_)));
        assert_eq!(client.transport().count(), 1);

        let client = self::client(vec![ok("<ExtensionImages><ExtensionImage>")]);
        let err = client.list_versions().await.unwrap_err();
        assert!(matches!(err, ClientError::MalformedResponse(_)));
        assert_eq!(client.transport().count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_polls_the_operation_endpoint() {
        let client = client(vec![
            operation("InProgress"),
            Ok(ManagementResponse::new(503, "Service Unavailable")),
            operation("Succeeded"),
        ]);

        let done = client
            .wait_for_operation(&OperationId::new("op/42"))
            .await
            .unwrap();
        assert_eq!(done.queries, 3);

        let requests = client.transport().requests();
        assert_eq!(requests.len(), 3);
        assert!(requests
            .iter()
            .all(|r| r.method == Method::Get && r.segments == ["operations", "op/42"]));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_reports_server_side_failure() {
        let client = client(vec![ok("<Operation><ID>op</ID><Status>Failed</Status>\
            <Error><Code>InternalError</Code><Message>Replication failed.</Message></Error></Operation>")]);

        let err = client
            .wait_for_operation(&OperationId::new("op"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::OperationFailed { ref code, .. } if code == "InternalError"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_can_be_cancelled() {
        let client = client(vec![]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = client
            .wait_for_operation_with_cancel(&OperationId::new("op"), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::OperationCancelled { .. }));
        assert_eq!(client.transport().count(), 0);
    }
}
