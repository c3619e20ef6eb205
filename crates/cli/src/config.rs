//! Global settings shared by every command.
//!
//! Each flag can also be supplied through the environment, so the binary can
//! run unattended with a token injected by the scheduler.

use std::time::Duration;

use anyhow::{bail, Context};
use clap::Args;
use cycle::CYCLE_ENDPOINT;
use domain::WorkspaceSlug;
use graphql::{ExecutorConfig, ExponentialBackoff, FixedBackoff, MAX_RETRIES};
use paging::{CollectorOptions, DEFAULT_MAX_PAGES};
use tokio_util::sync::CancellationToken;

use crate::telemetry::LogFormat;

/// Upper bound for exponential back-off delays.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Clone, Args)]
pub struct CliConfig {
    /// GraphQL endpoint of the Cycle API.
    #[arg(long, env = "CYCLE_ENDPOINT", default_value = CYCLE_ENDPOINT, global = true)]
    pub endpoint: String,

    /// API token, sent as a bearer credential.
    #[arg(long, env = "CYCLE_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Slug of the workspace to operate on.
    #[arg(long, env = "CYCLE_WORKSPACE_SLUG", global = true)]
    pub workspace: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 30, global = true)]
    pub timeout_secs: u64,

    /// Attempts per request, including the first.
    #[arg(long, default_value_t = MAX_RETRIES, global = true)]
    pub max_attempts: u32,

    /// Delay between attempts in milliseconds (base delay with --exponential-backoff).
    #[arg(long, default_value_t = 1000, global = true)]
    pub retry_delay_ms: u64,

    /// Double the retry delay after every failed attempt.
    #[arg(long, global = true)]
    pub exponential_backoff: bool,

    /// Stop a listing after this many pages.
    #[arg(long, default_value_t = DEFAULT_MAX_PAGES, global = true)]
    pub max_pages: usize,

    /// Pause between page fetches in milliseconds.
    #[arg(long, default_value_t = 0, global = true)]
    pub page_delay_ms: u64,

    #[arg(long, value_enum, env = "CYCLE_SYNC_LOG_FORMAT", default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,
}

impl std::fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("workspace", &self.workspace)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("exponential_backoff", &self.exponential_backoff)
            .field("max_pages", &self.max_pages)
            .field("page_delay_ms", &self.page_delay_ms)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl CliConfig {
    pub fn executor_config(&self) -> anyhow::Result<ExecutorConfig> {
        if self.timeout_secs == 0 {
            bail!("--timeout-secs must be greater than zero");
        }
        let retry_delay = Duration::from_millis(self.retry_delay_ms);
        let config = ExecutorConfig::new(self.endpoint.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_max_attempts(self.max_attempts);
        let config = match &self.token {
            Some(token) => config.with_token(token.clone()),
            None => config,
        };
        let config = if self.exponential_backoff {
            config.with_backoff(ExponentialBackoff::new(retry_delay, MAX_BACKOFF))
        } else {
            config.with_backoff(FixedBackoff::new(retry_delay))
        };
        config.validate().context("invalid executor settings")?;
        Ok(config)
    }

    pub fn collector_options(&self, cancellation: CancellationToken) -> CollectorOptions {
        CollectorOptions::default()
            .with_max_pages(self.max_pages)
            .with_inter_page_delay(Duration::from_millis(self.page_delay_ms))
            .with_cancellation(cancellation)
    }

    pub fn workspace_slug(&self) -> anyhow::Result<WorkspaceSlug> {
        self.workspace
            .as_deref()
            .and_then(WorkspaceSlug::new)
            .context("a workspace is required: pass --workspace or set CYCLE_WORKSPACE_SLUG")
    }
}

/// Parses global flags the way the binary does.
#[cfg(test)]
pub(crate) fn test_config(args: &[&str]) -> CliConfig {
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        config: CliConfig,
    }

    let mut argv = vec!["cycle-sync"];
    argv.extend_from_slice(args);
    Harness::try_parse_from(argv).unwrap().config
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliConfig {
        test_config(args)
    }

    #[test]
    fn defaults_follow_the_executor_and_collector_defaults() {
        let config = parse(&["--endpoint", "https://example.test/graphql"]);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.retry_delay_ms, 1000);
        assert_eq!(config.max_pages, 10_000);

        let executor = config.executor_config().unwrap();
        assert_eq!(executor.timeout, Duration::from_secs(30));
        assert_eq!(executor.backoff.delay(2), Duration::from_secs(1));

        let options = config.collector_options(CancellationToken::new());
        assert!(options.inter_page_delay.is_none());
        assert!(options.initial_cursor.is_empty());
    }

    #[test]
    fn exponential_backoff_doubles_from_the_base_delay() {
        let config = parse(&[
            "--endpoint",
            "https://example.test/graphql",
            "--retry-delay-ms",
            "200",
            "--exponential-backoff",
        ]);
        let executor = config.executor_config().unwrap();
        assert_eq!(executor.backoff.delay(1), Duration::from_millis(200));
        assert_eq!(executor.backoff.delay(3), Duration::from_millis(800));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = parse(&["--endpoint", "https://example.test/graphql", "--timeout-secs", "0"]);
        assert!(config.executor_config().is_err());
    }

    #[test]
    fn missing_workspace_is_reported() {
        let config = parse(&["--endpoint", "https://example.test/graphql", "--workspace", ""]);
        let err = config.workspace_slug().unwrap_err();
        assert!(err.to_string().contains("--workspace"));
    }

    #[test]
    fn debug_output_hides_the_token() {
        let config = parse(&["--endpoint", "https://example.test/graphql", "--token", "s3cr3t"]);
        assert!(!format!("{config:?}").contains("s3cr3t"));
    }
}
