//! In-process transport double for unit tests.

use crate::core::errors::{CloudError, TransportErrorKind};
use crate::core::kernel::transport::Transport;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

/// Replays canned JSON bodies in order; the last one repeats forever.
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Value>>,
    failure: Option<TransportErrorKind>,
    delay: Option<Duration>,
    requests: Mutex<Vec<Url>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<Value>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            failure: None,
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A transport whose every call fails with `kind`.
    pub fn failing(kind: TransportErrorKind) -> Self {
        let mut transport = Self::new(Vec::new());
        transport.failure = Some(kind);
        transport
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Value of `key` in the query string of the `index`th request.
    pub fn query_value(&self, index: usize, key: &str) -> Option<String> {
        let requests = self.requests.lock().unwrap();
        requests.get(index).and_then(|url| {
            url.query_pairs()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.into_owned())
        })
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, url: &Url) -> Result<Value, CloudError> {
        self.requests.lock().unwrap().push(url.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(kind) = self.failure {
            return Err(CloudError::transport(kind, "scripted failure"));
        }

        let mut responses = self.responses.lock().unwrap();
        let next = if responses.len() > 1 {
            responses.pop_front()
        } else {
            responses.front().cloned()
        };
        next.ok_or_else(|| {
            CloudError::transport(TransportErrorKind::Network, "no scripted response left")
        })
    }
}
