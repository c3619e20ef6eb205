//! GraphQL request execution for cycle-sync.
//!
//! [`RequestExecutor`] runs exactly one [`domain::Operation`] against the
//! configured endpoint, retrying transient failures (network errors, timeouts,
//! non-success HTTP statuses) up to a fixed number of attempts with a
//! pluggable [`Backoff`] between them. GraphQL `errors` in a success response
//! are handed back to the caller, never retried.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** All HTTP transport, header handling, retry timing, and
//! response decoding live here. Callers see only [`RequestExecutor`] and the
//! [`domain`] types.
//!
//! ## Defaults
//!
//! | Setting | Default |
//! |---------|---------|
//! | attempts | [`MAX_RETRIES`] (3) |
//! | back-off | [`FixedBackoff`] of [`DEFAULT_RETRY_DELAY`] (1s) |
//! | timeout | [`DEFAULT_TIMEOUT`] (30s) per attempt |

mod config;
mod executor;
mod http;
mod retry;

pub use config::{ExecutorConfig, DEFAULT_MAX_RETRY_AFTER, DEFAULT_TIMEOUT};
pub use executor::RequestExecutor;
pub use http::HttpTransport;
pub use retry::{Backoff, ExponentialBackoff, FixedBackoff, DEFAULT_RETRY_DELAY, MAX_RETRIES};
