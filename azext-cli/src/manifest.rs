//! XML manifests submitted through `updateExtension`.
//!
//! Field order matters to the service and is kept exactly as below.

use anyhow::{bail, Result};
use quick_xml::escape::escape;

use crate::cli::{ManifestArgs, VersionArgs};

/// Replaced by the package blob URL before the manifest is submitted.
pub const BLOB_URL_PLACEHOLDER: &str = "%BLOB_URL%";

/// Comment replaced by the target regions, if any.
pub const REGIONS_PLACEHOLDER: &str = "<!--%REGIONS%-->";

const HEADER: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<ExtensionImage xmlns="http://schemas.microsoft.com/windowsazure"  xmlns:i="http://www.w3.org/2001/XMLSchema-instance">
  <!-- WARNING: Ordering of fields matter in this file. -->
"#;

/// Manifest that publishes (or updates) an internal extension version.
pub fn publish_manifest(args: &ManifestArgs) -> String {
    let VersionArgs {
        namespace,
        name,
        version,
    } = &args.version;

    let mut xml = String::from(HEADER);
    xml.push_str(&format!(
        "  <ProviderNameSpace>{}</ProviderNameSpace>\n\
         \x20 <Type>{}</Type>\n\
         \x20 <Version>{}</Version>\n\
         \x20 <Label>{}</Label>\n\
         \x20 <HostingResources>VmRole</HostingResources>\n\
         \x20 <MediaLink>{}</MediaLink>\n\
         \x20 <Description>{}</Description>\n\
         \x20 <IsInternalExtension>true</IsInternalExtension>\n\
         \x20 <Eula>{}</Eula>\n\
         \x20 <PrivacyUri>{}</PrivacyUri>\n\
         \x20 <HomepageUri>{}</HomepageUri>\n\
         \x20 <IsJsonExtension>true</IsJsonExtension>\n\
         \x20 <CompanyName>{}</CompanyName>\n\
         \x20 <SupportedOS>{}</SupportedOS>\n\
         \x20 {}\n\
         </ExtensionImage>\n",
        escape(namespace.as_str()),
        escape(name.as_str()),
        escape(version.as_str()),
        escape(args.label.as_str()),
        BLOB_URL_PLACEHOLDER,
        escape(args.description.as_str()),
        escape(args.eula_url.as_str()),
        escape(args.privacy_url.as_str()),
        escape(args.homepage_url.as_str()),
        escape(args.company.as_str()),
        escape(args.supported_os.as_str()),
        REGIONS_PLACEHOLDER,
    ));
    xml
}

/// Manifest that keeps a version but marks it internal.
pub fn unpublish_manifest(version: &VersionArgs) -> String {
    let mut xml = String::from(HEADER);
    xml.push_str(&format!(
        "  <ProviderNameSpace>{}</ProviderNameSpace>\n\
         \x20 <Type>{}</Type>\n\
         \x20 <Version>{}</Version>\n\
         \x20 <IsInternalExtension>true</IsInternalExtension>\n\
         \x20 <IsJsonExtension>true</IsJsonExtension>\n\
         </ExtensionImage>",
        escape(version.namespace.as_str()),
        escape(version.name.as_str()),
        escape(version.version.as_str()),
    ));
    xml
}

/// Refuse manifests whose package location was never filled in.
pub fn ensure_submittable(manifest: &str) -> Result<()> {
    if manifest.trim().is_empty() {
        bail!("manifest is empty");
    }
    if manifest.contains(BLOB_URL_PLACEHOLDER) {
        bail!(
            "manifest still contains the {} placeholder; set <MediaLink> to the package blob URL",
            BLOB_URL_PLACEHOLDER
        );
    }
    Ok(())
}
