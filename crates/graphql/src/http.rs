//! reqwest-backed transport.

use std::time::Duration;

use async_trait::async_trait;
use domain::{ExecutionError, Transport, TransportResponse};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};

use crate::config::ExecutorConfig;

/// POSTs request bodies to the configured endpoint over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    endpoint: String,
    http: reqwest::Client,
}

impl HttpTransport {
    /// Builds the underlying client with JSON and (optional) bearer headers.
    ///
    /// The request timeout is enforced by the executor, not by reqwest, so a
    /// timeout surfaces as [`ExecutionError::Timeout`] regardless of transport.
    pub fn new(config: &ExecutorConfig) -> Result<Self, ExecutionError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                ExecutionError::Configuration {
                    message: "token contains characters not allowed in an HTTP header".to_string(),
                }
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.as_str())
            .connect_timeout(config.timeout)
            .build()
            .map_err(|err| ExecutionError::Configuration {
                message: format!("HTTP client could not be built: {err}"),
            })?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            http,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, body: &[u8]) -> Result<TransportResponse, ExecutionError> {
        let response = self
            .http
            .post(&self.endpoint)
            .body(body.to_vec())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let retry_after = parse_retry_after(response.headers());
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;

        Ok(TransportResponse {
            status,
            body: bytes.to_vec(),
            retry_after,
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ExecutionError {
    if err.is_builder() {
        return ExecutionError::Configuration {
            message: err.to_string(),
        };
    }
    ExecutionError::Transport {
        message: err.to_string(),
    }
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?;
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_after_accepts_delay_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(7)));
    }

    #[test]
    fn retry_after_ignores_http_dates() {
        let mut headers = HeaderMap::new();
        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn token_with_newline_is_a_configuration_error() {
        let config = ExecutorConfig::new("https://example.test/graphql").with_token("bad\ntoken");
        assert!(matches!(
            HttpTransport::new(&config),
            Err(ExecutionError::Configuration { .. })
        ));
    }
}
