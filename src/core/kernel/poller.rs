use crate::core::errors::{CloudError, ProtocolErrorKind};
use crate::core::kernel::encoder::RequestEncoder;
use crate::core::kernel::envelope::{self, Payload};
use crate::core::kernel::transport::{execute_cancellable, Transport};
use crate::core::types::{AsyncOptions, JobStatus, ParameterSet};
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

/// Operation used to check on a job.
pub const QUERY_ASYNC_JOB_RESULT: &str = "queryAsyncJobResult";

/// Shortest wait between two status queries.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Waits for an async job by polling `queryAsyncJobResult` at a fixed
/// interval until it succeeds, fails, or `expiry` has passed.
///
/// The wait between polls is a timer await, so other tasks keep running;
/// cancelling the token aborts both the wait and any in-flight request.
pub struct AsyncPoller<'a, T: Transport + ?Sized> {
    transport: &'a T,
    encoder: &'a RequestEncoder,
    options: AsyncOptions,
}

impl<'a, T: Transport + ?Sized> AsyncPoller<'a, T> {
    pub fn new(transport: &'a T, encoder: &'a RequestEncoder, options: AsyncOptions) -> Self {
        Self {
            transport,
            encoder,
            options,
        }
    }

    /// Poll until the job leaves the pending state.
    ///
    /// On success the job's `jobresult` object is returned.
    #[instrument(skip(self, cancel), fields(interval = ?self.options.poll_interval, expiry = ?self.options.expiry))]
    pub async fn poll(
        &self,
        job_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Payload, CloudError> {
        let started = Instant::now();
        let params = ParameterSet::from([("jobid", job_id)]);
        let mut attempts: u32 = 0;

        loop {
            let elapsed = started.elapsed();
            if elapsed >= self.options.expiry {
                warn!(attempts, "async job expired");
                return Err(CloudError::AsyncJobExpired {
                    job_id: job_id.to_string(),
                    waited: elapsed,
                });
            }

            let wait = self
                .options
                .poll_interval
                .max(MIN_POLL_INTERVAL)
                .min(self.options.expiry - elapsed);
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(CloudError::Cancelled),
                () = tokio::time::sleep(wait) => {}
            }

            attempts += 1;
            let url = self.encoder.encode(QUERY_ASYNC_JOB_RESULT, &params)?;
            let response = execute_cancellable(self.transport, &url, cancel).await?;
            let result = envelope::unwrap(response, QUERY_ASYNC_JOB_RESULT)?;

            match job_status(&result)? {
                JobStatus::Pending => {
                    debug!(
                        attempts,
                        remaining_secs = self
                            .options
                            .expiry
                            .saturating_sub(started.elapsed())
                            .as_secs(),
                        "job still pending"
                    );
                }
                JobStatus::Succeeded => {
                    debug!(attempts, "job succeeded");
                    return job_result(result);
                }
                JobStatus::Failed => {
                    let (code, text) = match result.get("jobresult") {
                        Some(Value::Object(jobresult)) => envelope::error_fields(jobresult),
                        _ => (0, String::new()),
                    };
                    return Err(CloudError::AsyncJobFailed {
                        job_id: job_id.to_string(),
                        code,
                        text,
                    });
                }
            }
        }
    }
}

fn job_status(result: &Payload) -> Result<JobStatus, CloudError> {
    let value = result.get("jobstatus").ok_or_else(|| {
        CloudError::protocol(
            ProtocolErrorKind::UnknownJobStatus,
            "job status response has no 'jobstatus'",
        )
    })?;
    envelope::as_i64(value)
        .and_then(JobStatus::from_code)
        .ok_or_else(|| {
            CloudError::protocol(
                ProtocolErrorKind::UnknownJobStatus,
                format!("unrecognised jobstatus {}", value),
            )
        })
}

fn job_result(mut result: Payload) -> Result<Payload, CloudError> {
    match result.remove("jobresult") {
        Some(Value::Object(payload)) => Ok(payload),
        Some(Value::Null) | None => Ok(Payload::new()),
        Some(other) => Err(CloudError::protocol(
            ProtocolErrorKind::UnexpectedEnvelopeShape,
            format!("jobresult is not an object: {}", other),
        )),
    }
}
