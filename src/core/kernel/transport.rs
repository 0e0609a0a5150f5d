use crate::core::errors::{CloudError, TransportErrorKind};
use crate::core::kernel::encoder::redacted;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace, warn};
use url::Url;

/// Transport trait for executing signed requests
///
/// A transport performs one GET and hands back the decoded JSON body. It
/// does not interpret HTTP status codes: the provider reports application
/// errors inside the JSON envelope, often on non-2xx responses, so any
/// well-formed JSON body is a success at this layer.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, url: &Url) -> Result<Value, CloudError>;
}

/// Configuration for the HTTP transport
#[derive(Clone, Debug)]
pub struct TransportConfig {
    /// Deadline for a single request, connect through body
    pub timeout: Duration,
    /// User agent string to include in requests
    pub user_agent: String,
    /// Verify the server's TLS certificate
    pub verify_tls: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("stackctl/", env!("CARGO_PKG_VERSION")).to_string(),
            verify_tls: true,
        }
    }
}

impl TransportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn with_verify_tls(mut self, verify_tls: bool) -> Self {
        self.verify_tls = verify_tls;
        self
    }

    pub fn build(self) -> Result<ReqwestTransport, CloudError> {
        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .danger_accept_invalid_certs(!self.verify_tls)
            .build()
            .map_err(|e| {
                CloudError::transport(
                    TransportErrorKind::Network,
                    format!("Failed to build HTTP client: {}", e),
                )
            })?;

        Ok(ReqwestTransport {
            client,
            config: self,
        })
    }
}

/// Implementation of `Transport` using reqwest
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
    config: TransportConfig,
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, CloudError> {
        TransportConfig::default().build()
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    #[instrument(skip(self, response), fields(status = %response.status()))]
    async fn handle_response(&self, response: Response) -> Result<Value, CloudError> {
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            let kind = if e.is_timeout() {
                TransportErrorKind::Timeout
            } else {
                TransportErrorKind::Network
            };
            CloudError::transport(kind, format!("Failed to read response body: {}", e))
        })?;

        trace!("Response body: {}", body);

        match serde_json::from_str(&body) {
            Ok(value) => {
                if !status.is_success() {
                    warn!(%status, "non-success status with a JSON body");
                }
                Ok(value)
            }
            Err(e) => Err(CloudError::transport(
                TransportErrorKind::MalformedJson,
                format!("HTTP {} with unparseable body: {}", status, e),
            )),
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(skip(self, url), fields(host = url.host_str().unwrap_or_default()))]
    async fn execute(&self, url: &Url) -> Result<Value, CloudError> {
        debug!(url = %redacted(url), "sending request");

        let response = self.client.get(url.clone()).send().await?;

        self.handle_response(response).await
    }
}

/// Run one request, abandoning it as soon as `cancel` fires.
pub async fn execute_cancellable<T: Transport + ?Sized>(
    transport: &T,
    url: &Url,
    cancel: &CancellationToken,
) -> Result<Value, CloudError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(CloudError::Cancelled),
        result = transport.execute(url) => result,
    }
}
