//! Command-line arguments.

use std::path::PathBuf;
use std::time::Duration;

use azext_core::config::{
    DEFAULT_POLL_DEADLINE_SECS, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_REQUEST_TIMEOUT_SECS,
    MANAGEMENT_API_VERSION, MANAGEMENT_ENDPOINT,
};
use azext_core::{ClientConfig, PollSettings};
use clap::builder::NonEmptyStringValueParser;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "azure-extensions-cli",
    version,
    about = "Release, update and manage Azure Virtual Machine extension versions as an extension publisher."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print an XML manifest used to publish or update an extension
    NewExtensionManifest(ManifestArgs),

    /// List all published extension versions for the subscription
    ListVersions {
        #[command(flatten)]
        subscription: SubscriptionArgs,
    },

    /// Show replication status of an uploaded extension version
    ReplicationStatus {
        #[command(flatten)]
        subscription: SubscriptionArgs,
        #[command(flatten)]
        version: VersionArgs,
    },

    /// Submit an extension manifest (output of new-extension-manifest) and wait for it
    UpdateVersion {
        #[command(flatten)]
        subscription: SubscriptionArgs,
        /// Path of the XML manifest for the extension package
        #[arg(long)]
        manifest: PathBuf,
    },

    /// Mark the extension version internal. Does not delete it
    UnpublishVersion {
        #[command(flatten)]
        subscription: SubscriptionArgs,
        #[command(flatten)]
        version: VersionArgs,
    },

    /// Delete the extension version. It should be unpublished first
    DeleteVersion {
        #[command(flatten)]
        subscription: SubscriptionArgs,
        #[command(flatten)]
        version: VersionArgs,
    },
}

/// Publisher subscription and connection tuning.
#[derive(Args, Debug, Clone)]
pub struct SubscriptionArgs {
    /// Subscription ID of the publisher subscription
    #[arg(long = "subscription-id", env = "AZEXT_SUBSCRIPTION_ID", value_parser = NonEmptyStringValueParser::new())]
    pub subscription_id: String,

    /// Path of the subscription management certificate (.pem) holding certificate and key
    #[arg(long = "subscription-cert", env = "AZEXT_SUBSCRIPTION_CERT")]
    pub subscription_cert: PathBuf,

    /// Service Management endpoint
    #[arg(long, env = "AZEXT_ENDPOINT", default_value = MANAGEMENT_ENDPOINT)]
    pub endpoint: String,

    /// Service Management API version sent as x-ms-version
    #[arg(long = "api-version", env = "AZEXT_API_VERSION", default_value = MANAGEMENT_API_VERSION)]
    pub api_version: String,

    /// Seconds between operation status queries
    #[arg(long = "poll-interval", env = "AZEXT_POLL_INTERVAL_SECS", default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
    pub poll_interval_secs: u64,

    /// Maximum seconds to wait for an operation to finish
    #[arg(long = "poll-deadline", env = "AZEXT_POLL_DEADLINE_SECS", default_value_t = DEFAULT_POLL_DEADLINE_SECS)]
    pub poll_deadline_secs: u64,

    /// Timeout in seconds for a single HTTP request
    #[arg(long = "request-timeout", env = "AZEXT_REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,
}

impl SubscriptionArgs {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::default()
            .with_endpoint(self.endpoint.clone())
            .with_api_version(self.api_version.clone())
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs))
            .with_poll_settings(
                PollSettings::default()
                    .with_interval(Duration::from_secs(self.poll_interval_secs))
                    .with_deadline(Duration::from_secs(self.poll_deadline_secs)),
            )
    }
}

/// Identifies one extension version.
#[derive(Args, Debug, Clone)]
pub struct VersionArgs {
    /// Publisher namespace e.g. Microsoft.Azure.Extensions
    #[arg(long, value_parser = NonEmptyStringValueParser::new())]
    pub namespace: String,

    /// Name of the extension e.g. FooExtension
    #[arg(long, value_parser = NonEmptyStringValueParser::new())]
    pub name: String,

    /// Version of the extension package e.g. 1.0.0
    #[arg(long, value_parser = NonEmptyStringValueParser::new())]
    pub version: String,
}

#[derive(Args, Debug, Clone)]
pub struct ManifestArgs {
    #[command(flatten)]
    pub version: VersionArgs,

    /// Human readable name of the extension
    #[arg(long, value_parser = NonEmptyStringValueParser::new())]
    pub label: String,

    /// Description of the extension
    #[arg(long, value_parser = NonEmptyStringValueParser::new())]
    pub description: String,

    /// URL to the End-User License Agreement page
    #[arg(long = "eula-url", value_parser = NonEmptyStringValueParser::new())]
    pub eula_url: String,

    /// URL to the Privacy Policy page
    #[arg(long = "privacy-url", value_parser = NonEmptyStringValueParser::new())]
    pub privacy_url: String,

    /// URL to the homepage of the extension
    #[arg(long = "homepage-url", value_parser = NonEmptyStringValueParser::new())]
    pub homepage_url: String,

    /// Human-readable company name of the publisher
    #[arg(long, value_parser = NonEmptyStringValueParser::new())]
    pub company: String,

    /// Extension platform e.g. 'Linux'
    #[arg(long = "supported-os", value_parser = NonEmptyStringValueParser::new())]
    pub supported_os: String,
}
