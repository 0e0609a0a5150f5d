use crate::cloudstack::client::CloudStackClient;
use crate::cloudstack::rest::CloudStackApi;
use crate::core::config::ClientConfig;
use crate::core::errors::CloudError;
use crate::core::kernel::{RequestEncoder, ReqwestTransport, Signer, TransportConfig};
use std::sync::Arc;

/// Builder for a reqwest-backed `CloudStackClient`
pub struct ClientBuilder {
    config: ClientConfig,
    transport: TransportConfig,
    signer: Option<Arc<dyn Signer>>,
}

impl ClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        let transport = TransportConfig::new()
            .with_timeout(config.http_timeout)
            .with_verify_tls(config.verify_tls);
        Self {
            config,
            transport,
            signer: None,
        }
    }

    /// Replace the default HMAC-SHA1 signer
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn build(self) -> Result<CloudStackClient<ReqwestTransport>, CloudError> {
        if !self.config.has_credentials() {
            return Err(CloudError::InvalidParameters(
                "API key and secret key are required".to_string(),
            ));
        }

        let encoder = match self.signer {
            Some(signer) => RequestEncoder::with_signer(
                &self.config.endpoint,
                self.config.credentials.clone(),
                signer,
            )?,
            None => RequestEncoder::new(&self.config.endpoint, self.config.credentials.clone())?,
        };
        let transport = self.transport.build()?;

        Ok(CloudStackClient::new(
            transport,
            encoder,
            self.config.async_options,
        ))
    }

    /// Build the typed API wrapper, carrying the configured project.
    pub fn build_api(self) -> Result<CloudStackApi<ReqwestTransport>, CloudError> {
        let project_id = self.config.project_id.clone();
        Ok(CloudStackApi::new(self.build()?, project_id))
    }
}

/// `NewClient(apiKey, secretKey, endpoint)` with default timeouts.
pub fn connect(
    api_key: &str,
    secret_key: &str,
    endpoint: &str,
) -> Result<CloudStackClient<ReqwestTransport>, CloudError> {
    ClientBuilder::new(ClientConfig::new(
        api_key.to_string(),
        secret_key.to_string(),
        endpoint.to_string(),
    ))
    .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::AsyncOptions;
    use std::time::Duration;

    #[test]
    fn test_build_carries_settings() {
        let config = ClientConfig::new(
            "k".to_string(),
            "s".to_string(),
            "https://cloud.example.com/client/api".to_string(),
        )
        .http_timeout(Duration::from_secs(7))
        .async_options(AsyncOptions::default().expiry(Duration::from_secs(60)));

        let client = ClientBuilder::new(config).build().unwrap();
        assert_eq!(client.transport().config().timeout, Duration::from_secs(7));
        assert_eq!(client.async_options().expiry, Duration::from_secs(60));
        assert_eq!(
            client.encoder().endpoint().as_str(),
            "https://cloud.example.com/client/api"
        );
    }

    #[test]
    fn test_build_requires_credentials() {
        let config = ClientConfig::new(String::new(), "s".to_string(), "http://x".to_string());
        assert!(matches!(
            ClientBuilder::new(config).build(),
            Err(CloudError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_build_api_keeps_project() {
        let config = ClientConfig::new("k".to_string(), "s".to_string(), "http://x".to_string())
            .project_id(Some("p-9".to_string()));
        let api = ClientBuilder::new(config).build_api().unwrap();
        assert_eq!(api.project_id(), Some("p-9"));
    }

    #[test]
    fn test_connect() {
        assert!(connect("k", "s", "http://localhost:8080/client/api").is_ok());
        assert!(connect("k", "s", "::nope::").is_err());
    }
}
