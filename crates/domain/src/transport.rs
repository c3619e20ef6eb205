//! The transport port.
//!
//! A [`Transport`] delivers one serialised request body to the GraphQL endpoint
//! and reports what came back. It performs exactly one attempt: retries,
//! timeouts, and status classification belong to the executor.

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::ExecutionError;

/// Raw outcome of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Vec<u8>,
    /// Parsed `Retry-After` header, when present.
    pub retry_after: Option<Duration>,
}

impl TransportResponse {
    /// Creates a response without a `Retry-After` hint.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
            retry_after: None,
        }
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a request body to the GraphQL endpoint.
///
/// Implementations return `Ok` for every HTTP response, whatever its status,
/// and `Err` only when no response was obtained.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Performs one POST of `body` and returns the response.
    async fn send(&self, body: &[u8]) -> Result<TransportResponse, ExecutionError>;
}
