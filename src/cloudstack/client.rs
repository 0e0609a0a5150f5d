use crate::core::errors::{CloudError, ProtocolErrorKind};
use crate::core::kernel::envelope::{self, Payload};
use crate::core::kernel::{execute_cancellable, AsyncPoller, RequestEncoder, Transport};
use crate::core::types::{AsyncOptions, ParameterSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// Single entry point for API calls.
///
/// Holds the immutable endpoint/credentials (inside the encoder) and a
/// transport; cloning is not needed to share it, every method takes `&self`
/// and concurrent calls are independent.
pub struct CloudStackClient<T: Transport> {
    transport: T,
    encoder: RequestEncoder,
    async_options: AsyncOptions,
}

impl<T: Transport> std::fmt::Debug for CloudStackClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudStackClient")
            .field("encoder", &self.encoder)
            .field("async_options", &self.async_options)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> CloudStackClient<T> {
    /// Create a client with dependency injection
    pub fn new(transport: T, encoder: RequestEncoder, async_options: AsyncOptions) -> Self {
        Self {
            transport,
            encoder,
            async_options,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn encoder(&self) -> &RequestEncoder {
        &self.encoder
    }

    pub fn async_options(&self) -> AsyncOptions {
        self.async_options
    }

    /// Invoke `operation` with the client's default polling options.
    pub async fn invoke(
        &self,
        operation: &str,
        params: &ParameterSet,
        is_async: bool,
    ) -> Result<Payload, CloudError> {
        self.invoke_with(
            operation,
            params,
            is_async,
            self.async_options,
            &CancellationToken::new(),
        )
        .await
    }

    /// Invoke `operation`, returning its unwrapped payload.
    ///
    /// For async operations the call blocks (asynchronously) until the job
    /// finishes and returns the job's result, unless `options.block` is
    /// false, in which case the payload holding `jobid` is returned right
    /// away. Every stage's error is passed through unchanged.
    #[instrument(skip(self, params, cancel), fields(param_count = params.len()))]
    pub async fn invoke_with(
        &self,
        operation: &str,
        params: &ParameterSet,
        is_async: bool,
        options: AsyncOptions,
        cancel: &CancellationToken,
    ) -> Result<Payload, CloudError> {
        debug!("request start");
        let url = self.encoder.encode(operation, params)?;
        let response = execute_cancellable(&self.transport, &url, cancel).await?;
        let payload = envelope::unwrap(response, operation)?;
        debug!("request end");

        if !is_async || !options.block {
            return Ok(payload);
        }

        let job_id = envelope::job_id(&payload).ok_or_else(|| {
            CloudError::protocol(
                ProtocolErrorKind::MissingJobId,
                format!("async operation {} returned no jobid", operation),
            )
        })?;
        debug!(%job_id, "waiting for async job");

        AsyncPoller::new(&self.transport, &self.encoder, options)
            .poll(&job_id, cancel)
            .await
    }
}
