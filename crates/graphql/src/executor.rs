//! Bounded-retry execution of a single GraphQL operation.

use std::sync::Arc;
use std::time::Duration;

use domain::{
    ExecutionError, ExecutionResult, GraphqlResponse, Operation, RetryPolicy, Transport,
    TransportResponse,
};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, warn, Instrument};

use crate::config::ExecutorConfig;
use crate::http::HttpTransport;
use crate::retry::Backoff;

/// Executes operations against one endpoint.
///
/// Cheap to clone; clones share the transport and the cancellation token.
/// Holds no per-call state, so independent operations may run concurrently.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    endpoint: String,
    timeout: Duration,
    max_attempts: u32,
    backoff: Arc<dyn Backoff>,
    max_retry_after: Duration,
    cancellation: CancellationToken,
}

impl RequestExecutor {
    /// Creates an executor over HTTPS.
    pub fn new(config: ExecutorConfig) -> Result<Self, ExecutionError> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Creates an executor over a caller-supplied transport.
    ///
    /// The config's endpoint is only used for logging in this case.
    pub fn with_transport(
        config: ExecutorConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ExecutionError> {
        config.validate()?;
        Ok(Self {
            transport,
            endpoint: config.endpoint,
            timeout: config.timeout,
            max_attempts: config.max_attempts,
            backoff: config.backoff,
            max_retry_after: config.max_retry_after,
            cancellation: CancellationToken::new(),
        })
    }

    /// Aborts in-flight requests and retry sleeps when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// The endpoint this executor talks to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Executes `operation` and returns the decoded response, GraphQL errors included.
    ///
    /// Transient failures are retried up to the configured attempt count.
    /// A 2xx body that does not decode into `T` fails with
    /// [`ExecutionError::Decode`] without retrying.
    pub async fn execute<T>(&self, operation: &Operation) -> ExecutionResult<T>
    where
        T: DeserializeOwned,
    {
        let span = info_span!(
            "graphql.execute",
            operation = operation.operation_name().unwrap_or("anonymous"),
            endpoint = %self.endpoint,
        );
        async move {
            let body = operation.to_body()?;
            let response = self.send_with_retry(&body).await?;
            let decoded: GraphqlResponse<T> =
                serde_json::from_slice(&response.body).map_err(|err| ExecutionError::Decode {
                    message: err.to_string(),
                })?;
            debug!(
                graphql_errors = decoded.errors.len(),
                "GraphQL request completed"
            );
            Ok::<_, ExecutionError>(decoded)
        }
        .instrument(span)
        .await
    }

    /// Executes `operation` and requires data without GraphQL errors.
    pub async fn execute_data<T>(&self, operation: &Operation) -> Result<T, ExecutionError>
    where
        T: DeserializeOwned,
    {
        self.execute::<T>(operation).await?.into_data()
    }

    async fn send_with_retry(&self, body: &[u8]) -> Result<TransportResponse, ExecutionError> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            if self.cancellation.is_cancelled() {
                return Err(ExecutionError::Cancelled);
            }
            if attempt > 1 {
                debug!(attempt, "sending GraphQL request again");
            }

            let error = match self.send_once(body).await {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };

            let after = match error.retry_policy() {
                RetryPolicy::Retryable { after } => after,
                RetryPolicy::NonRetryable => return Err(error),
            };

            if attempt >= self.max_attempts {
                warn!(attempts = attempt, error = %error, "GraphQL request failed; no attempts left");
                return Err(ExecutionError::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(error),
                });
            }

            let requested = after.map_or(Duration::ZERO, |after| after.min(self.max_retry_after));
            let delay = self.backoff.delay(attempt).max(requested);
            warn!(
                attempt,
                max_attempts = self.max_attempts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %error,
                "GraphQL attempt failed; retrying"
            );
            self.pause(delay).await?;
        }
    }

    async fn send_once(&self, body: &[u8]) -> Result<TransportResponse, ExecutionError> {
        let outcome = tokio::select! {
            biased;
            () = self.cancellation.cancelled() => return Err(ExecutionError::Cancelled),
            outcome = tokio::time::timeout(self.timeout, self.transport.send(body)) => outcome,
        };
        let response = outcome.map_err(|_| ExecutionError::Timeout {
            after: self.timeout,
        })??;

        if !response.is_success() {
            return Err(ExecutionError::HttpStatus {
                status: response.status,
                body: truncate_body(&response.body),
                retry_after: response.retry_after,
            });
        }
        Ok(response)
    }

    async fn pause(&self, delay: Duration) -> Result<(), ExecutionError> {
        tokio::select! {
            biased;
            () = self.cancellation.cancelled() => Err(ExecutionError::Cancelled),
            () = tokio::time::sleep(delay) => Ok(()),
        }
    }
}

fn truncate_body(bytes: &[u8]) -> String {
    const MAX_LEN: usize = 4096;
    let mut body = String::from_utf8_lossy(bytes).into_owned();
    if body.len() > MAX_LEN {
        let mut cut = MAX_LEN;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push('…');
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_body_keeps_short_bodies() {
        assert_eq!(truncate_body(b"bad gateway"), "bad gateway");
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "é".repeat(3000);
        let truncated = truncate_body(body.as_bytes());
        assert!(truncated.ends_with('…'));
        assert!(truncated.len() <= 4096 + '…'.len_utf8());
    }
}
