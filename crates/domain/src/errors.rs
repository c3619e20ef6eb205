//! Error and retry-classification types.
//!
//! [`ExecutionError`] covers everything that can go wrong while executing a
//! single operation. [`PaginationError`] wraps those failures with the page at
//! which a collection run stopped.
//!
//! [`RetryPolicy`] is the cross-cutting classification: the executor asks each
//! error whether another attempt is allowed and, if so, after what delay.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identifiers::Cursor;
use crate::operation::GraphqlError;

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry and, if so, after what delay.
///
/// - `Retryable`: network failures, timeouts, non-success HTTP statuses.
/// - `NonRetryable`: GraphQL errors, decode failures, cancellation,
///   configuration problems, exhausted retries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    Retryable {
        /// Minimum delay before the next attempt (from `Retry-After`).
        /// `None` means the caller's own back-off schedule applies.
        after: Option<Duration>,
    },
    /// The operation must not be retried.
    NonRetryable,
}

// ---------------------------------------------------------------------------
// Execution errors
// ---------------------------------------------------------------------------

/// Failure of a single operation execution.
#[derive(Debug, Clone, Error)]
pub enum ExecutionError {
    /// Network-level failure (connection refused, DNS, reset).
    #[error("transport error: {message}")]
    Transport {
        /// Underlying error message.
        message: String,
    },

    /// The request did not complete within the configured timeout.
    #[error("request timed out after {after:?}")]
    Timeout {
        /// The timeout that elapsed.
        after: Duration,
    },

    /// The endpoint answered with a non-success HTTP status.
    #[error("HTTP status {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Response body text (truncated).
        body: String,
        /// `Retry-After` duration when the server supplied one.
        retry_after: Option<Duration>,
    },

    /// The response carried GraphQL errors.
    ///
    /// Only produced by strict execution; plain execution hands errors back
    /// inside the response.
    #[error("GraphQL errors: {}", summarize(.errors))]
    Graphql {
        /// GraphQL error list.
        errors: Vec<GraphqlError>,
    },

    /// A success response whose body did not match the expected shape.
    #[error("response did not match the expected shape: {message}")]
    Decode {
        /// Decoder message.
        message: String,
    },

    /// A success response with neither `data` nor `errors`.
    #[error("response carried no data")]
    MissingData,

    /// Every allowed attempt failed transiently.
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// The error observed on the final attempt.
        last: Box<ExecutionError>,
    },

    /// The caller cancelled the execution.
    #[error("request cancelled")]
    Cancelled,

    /// The executor or the operation is misconfigured.
    #[error("invalid configuration: {message}")]
    Configuration {
        /// Description of the problem.
        message: String,
    },
}

impl ExecutionError {
    /// Classifies this error for the retry loop.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => RetryPolicy::Retryable { after: None },
            Self::HttpStatus { retry_after, .. } => RetryPolicy::Retryable {
                after: *retry_after,
            },
            Self::Graphql { .. }
            | Self::Decode { .. }
            | Self::MissingData
            | Self::RetriesExhausted { .. }
            | Self::Cancelled
            | Self::Configuration { .. } => RetryPolicy::NonRetryable,
        }
    }

    /// Returns `true` if another attempt is allowed.
    pub fn is_retryable(&self) -> bool {
        matches!(self.retry_policy(), RetryPolicy::Retryable { .. })
    }

    /// Returns `true` if this error, or the last attempt it wraps, is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::RetriesExhausted { last, .. } => last.is_cancelled(),
            _ => false,
        }
    }
}

fn summarize(errors: &[GraphqlError]) -> String {
    if errors.is_empty() {
        return "(empty error list)".to_string();
    }
    errors
        .iter()
        .map(|err| err.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

// ---------------------------------------------------------------------------
// Pagination errors
// ---------------------------------------------------------------------------

/// Why a collection run stopped early.
///
/// Page indices are 1-based: the first fetch is page 1.
#[derive(Debug, Clone, Error)]
pub enum PaginationError {
    /// A page fetch returned a terminal failure.
    #[error("fetching page {page} (cursor '{cursor}') failed: {source}")]
    Fetch {
        /// Index of the failing page.
        page: usize,
        /// Cursor passed to the failing fetch.
        cursor: Cursor,
        /// The executor's terminal error.
        source: ExecutionError,
    },

    /// A page announced a next page but gave no usable cursor.
    #[error("page {page} reported a next page without an end cursor")]
    MissingCursor {
        /// Index of the offending page.
        page: usize,
    },

    /// The run reached its page cap while the API still reported more pages.
    #[error("pagination stopped after the limit of {max_pages} pages")]
    PageLimitExceeded {
        /// Configured cap.
        max_pages: usize,
    },

    /// The run was cancelled before fetching `page`.
    #[error("pagination cancelled before page {page} completed")]
    Cancelled {
        /// Index of the page that was not completed.
        page: usize,
    },
}

impl PaginationError {
    /// Page index at which the run stopped, when one applies.
    pub fn page(&self) -> Option<usize> {
        match self {
            Self::Fetch { page, .. } | Self::MissingCursor { page } | Self::Cancelled { page } => {
                Some(*page)
            }
            Self::PageLimitExceeded { .. } => None,
        }
    }

    /// Returns `true` if the run stopped because of cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
