//! Executor configuration.

use std::sync::Arc;
use std::time::Duration;

use domain::ExecutionError;

use crate::retry::{Backoff, FixedBackoff, MAX_RETRIES};

/// Default per-attempt request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default ceiling on a server-requested `Retry-After` wait.
pub const DEFAULT_MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Everything the executor needs to talk to one endpoint.
///
/// Built once at the composition root and passed in; nothing is read from
/// process-wide state.
#[derive(Clone)]
pub struct ExecutorConfig {
    /// GraphQL endpoint URL.
    pub endpoint: String,
    /// Bearer token sent as `Authorization: Bearer <token>`.
    pub token: Option<String>,
    /// Per-attempt timeout.
    pub timeout: Duration,
    /// Maximum attempts, including the first.
    pub max_attempts: u32,
    /// Delay strategy between attempts.
    pub backoff: Arc<dyn Backoff>,
    /// Longest wait honoured from a `Retry-After` header.
    pub max_retry_after: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl ExecutorConfig {
    /// Configuration with defaults for everything but the endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
            max_attempts: MAX_RETRIES,
            backoff: Arc::new(FixedBackoff::default()),
            max_retry_after: DEFAULT_MAX_RETRY_AFTER,
            user_agent: concat!("cycle-sync/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Sets the bearer token. Empty tokens are ignored.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = if token.is_empty() { None } else { Some(token) };
        self
    }

    /// Sets the per-attempt timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum number of attempts.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the back-off strategy.
    #[must_use]
    pub fn with_backoff(mut self, backoff: impl Backoff + 'static) -> Self {
        self.backoff = Arc::new(backoff);
        self
    }

    /// Caps how long a `Retry-After` header may delay the next attempt.
    #[must_use]
    pub const fn with_max_retry_after(mut self, max_retry_after: Duration) -> Self {
        self.max_retry_after = max_retry_after;
        self
    }

    /// Checks the invariants the executor relies on.
    pub fn validate(&self) -> Result<(), ExecutionError> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(ExecutionError::Configuration {
                message: format!("endpoint must be an http(s) URL, got '{}'", self.endpoint),
            });
        }
        if self.max_attempts == 0 {
            return Err(ExecutionError::Configuration {
                message: "max_attempts must be at least 1".to_string(),
            });
        }
        if self.timeout.is_zero() {
            return Err(ExecutionError::Configuration {
                message: "timeout must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for ExecutorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .field("max_retry_after", &self.max_retry_after)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
