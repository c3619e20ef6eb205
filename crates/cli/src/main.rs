//! `cycle-sync`: export data from the Cycle GraphQL API.
//!
//! This binary is the composition root. It parses configuration, installs
//! tracing, wires Ctrl-C/SIGTERM to a cancellation token, builds the executor
//! and Cycle client, and runs one subcommand.
//!
//! Exit codes: 0 on success, 1 on any failure, 130 when interrupted.

use std::process::ExitCode;

use clap::Parser;
use domain::{PaginationError, SyncRunId};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};

mod commands;
mod config;
mod output;
mod shutdown;
mod telemetry;

use commands::{Command, Context};
use config::CliConfig;
use shutdown::{Exit, ShutdownCoordinator};

#[derive(Parser)]
#[command(name = "cycle-sync", version, about = "Export data from the Cycle GraphQL API")]
struct Cli {
    #[command(flatten)]
    config: CliConfig,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _telemetry = match telemetry::init(cli.config.log_format) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("cycle-sync: {err:#}");
            return Exit::Failure.into();
        }
    };

    let shutdown = ShutdownCoordinator::new(CancellationToken::new());
    shutdown.register_handlers();

    let run_id = SyncRunId::new_random();
    let command_name = cli.command.name();
    let span = info_span!("cycle_sync", run_id = %run_id, command = command_name);

    let result = async {
        info!(endpoint = %cli.config.endpoint, "starting");
        let ctx = Context::new(cli.config, shutdown.cancel_token())?;
        commands::run(cli.command, &ctx).await
    }
    .instrument(span.clone())
    .await;

    let _entered = span.enter();
    outcome(command_name, &result, shutdown.is_shutdown_requested()).into()
}

/// Maps a command's result to the process exit code, logging failures.
fn outcome(command: &str, result: &anyhow::Result<()>, shutdown_requested: bool) -> Exit {
    match result {
        Ok(()) => Exit::Success,
        Err(err) if shutdown_requested || is_cancellation(err) => {
            warn!(command, error = %format!("{err:#}"), "interrupted");
            Exit::Interrupted
        }
        Err(err) => {
            report_failure(command, err);
            Exit::Failure
        }
    }
}

fn is_cancellation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<PaginationError>()
            .is_some_and(PaginationError::is_cancelled)
            || cause
                .downcast_ref::<domain::ExecutionError>()
                .is_some_and(domain::ExecutionError::is_cancelled)
    })
}

fn report_failure(command: &str, err: &anyhow::Error) {
    let message = format!("{err:#}");
    match err.chain().find_map(|cause| cause.downcast_ref::<PaginationError>()) {
        Some(PaginationError::Fetch { page, cursor, .. }) => error!(
            command,
            page,
            cursor = %cursor,
            error = %message,
            "command failed"
        ),
        Some(pagination) => error!(
            command,
            page = pagination.page(),
            error = %message,
            "command failed"
        ),
        None => error!(command, error = %message, "command failed"),
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Context as _;
    use domain::{Cursor, ExecutionError};

    use super::*;

    fn failed(err: impl Into<anyhow::Error>) -> anyhow::Result<()> {
        Err(err.into())
    }

    #[test]
    fn success_exits_zero() {
        assert_eq!(outcome("export", &Ok(()), false), Exit::Success);
    }

    #[test]
    fn cancelled_pagination_exits_130() {
        let result = failed(PaginationError::Cancelled { page: 3 });
        assert_eq!(outcome("export", &result, false), Exit::Interrupted);
    }

    #[test]
    fn cancellation_behind_context_exits_130() {
        let result: anyhow::Result<()> =
            Err(ExecutionError::Cancelled).context("cannot resolve workspace 'acme'");
        assert_eq!(outcome("workspace", &result, false), Exit::Interrupted);
    }

    #[test]
    fn page_fetch_failure_exits_one() {
        let result = failed(PaginationError::Fetch {
            page: 2,
            cursor: Cursor::new("c1"),
            source: ExecutionError::MissingData,
        });
        assert_eq!(outcome("export", &result, false), Exit::Failure);
    }

    #[test]
    fn any_failure_after_a_signal_exits_130() {
        let result = failed(ExecutionError::MissingData);
        assert_eq!(outcome("query", &result, true), Exit::Interrupted);
    }
}
