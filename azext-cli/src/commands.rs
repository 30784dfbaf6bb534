//! Subcommand handlers.

use std::path::Path;

use anyhow::{Context, Result};
use azext_core::{Credentials, ExtensionsClient, OperationId};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::{Cli, Command, SubscriptionArgs, VersionArgs};
use crate::{manifest, output};

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::NewExtensionManifest(args) => {
            print!("{}", manifest::publish_manifest(&args));
            Ok(())
        }
        Command::ListVersions { subscription } => list_versions(&subscription).await,
        Command::ReplicationStatus {
            subscription,
            version,
        } => replication_status(&subscription, &version).await,
        Command::UpdateVersion {
            subscription,
            manifest,
        } => update_version(&subscription, &manifest).await,
        Command::UnpublishVersion {
            subscription,
            version,
        } => unpublish_version(&subscription, &version).await,
        Command::DeleteVersion {
            subscription,
            version,
        } => delete_version(&subscription, &version).await,
    }
}

fn connect(args: &SubscriptionArgs) -> Result<ExtensionsClient> {
    let pem = std::fs::read(&args.subscription_cert).with_context(|| {
        format!(
            "failed to read subscription certificate {}",
            args.subscription_cert.display()
        )
    })?;
    let credentials = Credentials::from_pem(args.subscription_id.as_str(), &pem)?;
    info!(
        subscription_id = credentials.subscription_id(),
        thumbprint = credentials.thumbprint(),
        "Loaded management certificate"
    );
    Ok(ExtensionsClient::new(&credentials, args.client_config())?)
}

async fn list_versions(args: &SubscriptionArgs) -> Result<()> {
    let client = connect(args)?;
    info!("Requesting published extension versions");
    let versions = client.list_versions().await?;
    println!("{}", output::versions_table(&versions));
    Ok(())
}

async fn replication_status(args: &SubscriptionArgs, version: &VersionArgs) -> Result<()> {
    let client = connect(args)?;
    info!(
        namespace = %version.namespace,
        name = %version.name,
        version = %version.version,
        "Requesting replication status"
    );
    let statuses = client
        .get_replication_status(&version.namespace, &version.name, &version.version)
        .await?;
    println!("{}", output::replication_table(&statuses));
    Ok(())
}

async fn update_version(args: &SubscriptionArgs, path: &Path) -> Result<()> {
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest {}", path.display()))?;
    manifest::ensure_submittable(&body)?;

    let client = connect(args)?;
    info!(manifest = %path.display(), "Submitting extension manifest");
    let id = client.update_extension(body.as_bytes()).await?;
    wait(&client, &id, "UpdateExtension").await
}

async fn unpublish_version(args: &SubscriptionArgs, version: &VersionArgs) -> Result<()> {
    let client = connect(args)?;
    let body = manifest::unpublish_manifest(version);
    info!(
        namespace = %version.namespace,
        name = %version.name,
        version = %version.version,
        "Unpublishing extension version"
    );
    let id = client.update_extension(body.as_bytes()).await?;
    wait(&client, &id, "UpdateExtension").await
}

async fn delete_version(args: &SubscriptionArgs, version: &VersionArgs) -> Result<()> {
    let client = connect(args)?;
    warn!("Make sure the extension version is unpublished before deleting it");
    info!(
        namespace = %version.namespace,
        name = %version.name,
        version = %version.version,
        "Deleting extension version"
    );
    let id = client
        .delete_extension(&version.namespace, &version.name, &version.version)
        .await?;
    wait(&client, &id, "DeleteExtension").await
}

async fn wait(client: &ExtensionsClient, id: &OperationId, operation: &str) -> Result<()> {
    info!(operation_id = %id, "{operation} operation started");

    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, no longer waiting for the operation");
                cancel.cancel();
            }
        })
    };

    let result = client.wait_for_operation_with_cancel(id, &cancel).await;
    watcher.abort();

    let done = result.map_err(|err| {
        if let Some(op) = err.operation_id() {
            warn!(operation_id = %op, "{operation} operation did not complete");
        }
        anyhow::Error::from(err).context(format!("{operation} operation did not succeed"))
    })?;
    info!(
        operation_id = %done.id,
        queries = done.queries,
        elapsed_ms = done.elapsed.as_millis() as u64,
        "{operation} operation succeeded"
    );
    Ok(())
}
