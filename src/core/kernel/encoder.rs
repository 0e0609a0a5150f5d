use crate::core::config::Credentials;
use crate::core::errors::CloudError;
use crate::core::kernel::signer::{HmacSha1Signer, Signer};
use crate::core::types::ParameterSet;
use std::sync::Arc;
use url::Url;

/// Keys the encoder owns; callers cannot override them.
const RESERVED_KEYS: [&str; 4] = ["apikey", "command", "response", "signature"];

/// Builds signed GET URLs for a fixed endpoint and key pair.
#[derive(Clone)]
pub struct RequestEncoder {
    endpoint: Url,
    credentials: Credentials,
    signer: Arc<dyn Signer>,
}

impl std::fmt::Debug for RequestEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestEncoder")
            .field("endpoint", &self.endpoint.as_str())
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl RequestEncoder {
    /// Create an encoder that signs with HMAC-SHA1 over the credentials' secret.
    pub fn new(endpoint: &str, credentials: Credentials) -> Result<Self, CloudError> {
        let signer = Arc::new(HmacSha1Signer::new(credentials.secret_key().to_string()));
        Self::with_signer(endpoint, credentials, signer)
    }

    pub fn with_signer(
        endpoint: &str,
        credentials: Credentials,
        signer: Arc<dyn Signer>,
    ) -> Result<Self, CloudError> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            CloudError::InvalidParameters(format!("Invalid endpoint '{}': {}", endpoint, e))
        })?;
        Ok(Self {
            endpoint,
            credentials,
            signer,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Produce `endpoint?<params>&signature=<sig>`.
    ///
    /// `apikey`, `command` and `response=json` are added before signing so
    /// the signature covers them; `signature` is appended last.
    pub fn encode(&self, operation: &str, params: &ParameterSet) -> Result<Url, CloudError> {
        if operation.is_empty() {
            return Err(CloudError::InvalidParameters(
                "operation name is empty".to_string(),
            ));
        }
        if let Some(key) = params
            .iter()
            .map(|(k, _)| k)
            .find(|k| RESERVED_KEYS.contains(&k.to_lowercase().as_str()))
        {
            return Err(CloudError::InvalidParameters(format!(
                "'{}' is set by the client and cannot be passed as a parameter",
                key
            )));
        }

        let mut full = params.clone();
        full.insert("apikey", self.credentials.api_key())
            .insert("command", operation)
            .insert("response", "json");

        let signature = self.signer.sign(&full)?;

        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .extend_pairs(full.iter())
            .append_pair("signature", &signature);
        Ok(url)
    }
}

/// The URL with `apikey` and `signature` values masked, for logs.
pub fn redacted(url: &Url) -> String {
    let mut shown = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let value = match k.as_ref() {
                "apikey" | "signature" => "***".to_string(),
                _ => v.into_owned(),
            };
            (k.into_owned(), value)
        })
        .collect();
    shown.query_pairs_mut().clear().extend_pairs(pairs);
    shown.to_string()
}
