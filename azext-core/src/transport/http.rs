use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Url};
use tracing::{debug, trace};

use super::{ManagementRequest, ManagementResponse, ManagementTransport, Method};
use crate::config::{ClientConfig, API_VERSION_HEADER, XML_CONTENT_TYPE};
use crate::crypto::Credentials;
use crate::error::{ClientError, Result};

/// HTTPS transport authenticated by the subscription's management certificate.
///
/// The certificate is presented in the TLS handshake; no token is ever sent.
/// One pooled [`Client`] is built up front and reused for every request.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base: Url,
}

impl HttpTransport {
    /// Build the transport for `credentials` against `config.endpoint`.
    ///
    /// # Errors
    ///
    /// [`ClientError::InvalidArgument`] for an invalid configuration,
    /// [`ClientError::InvalidCertificate`] when the TLS layer refuses the
    /// client identity.
    pub fn new(credentials: &Credentials, config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut base = Url::parse(&config.endpoint)
            .map_err(|e| ClientError::InvalidArgument(format!("invalid endpoint: {}", e)))?;
        base.path_segments_mut()
            .map_err(|_| ClientError::InvalidArgument("endpoint cannot be a base URL".to_string()))?
            .pop_if_empty()
            .push(credentials.subscription_id());

        let mut headers = HeaderMap::new();
        let api_version = HeaderValue::from_str(&config.api_version)
            .map_err(|e| ClientError::InvalidArgument(format!("invalid api version: {}", e)))?;
        headers.insert(API_VERSION_HEADER, api_version);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(XML_CONTENT_TYPE));

        let client = Client::builder()
            .use_rustls_tls()
            .identity(credentials.identity()?)
            .default_headers(headers)
            .timeout(config.request_timeout)
            .user_agent(concat!("azure-extensions-cli/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::InvalidCertificate(format!("cannot build TLS client: {}", e)))?;

        debug!(
            endpoint = %base,
            thumbprint = credentials.thumbprint(),
            "Created management transport"
        );

        Ok(Self { client, base })
    }

    fn url_for(&self, request: &ManagementRequest) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.extend(request.segments.iter());
        }
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        url
    }
}

#[async_trait]
impl ManagementTransport for HttpTransport {
    async fn send(&self, request: ManagementRequest) -> Result<ManagementResponse> {
        let url = self.url_for(&request);
        debug!(method = request.method.as_str(), %url, "Sending management request");

        let builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Put => self.client.put(url),
            Method::Delete => self.client.delete(url),
        };
        let builder = match request.body {
            Some(body) => builder.body(body),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;

        trace!(status, body_len = body.len(), "Received management response");

        Ok(ManagementResponse {
            status,
            headers,
            body,
        })
    }
}
