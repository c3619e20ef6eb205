//! Subcommands and their shared wiring.

mod export;
mod import;
mod query;

use std::path::PathBuf;

use anyhow::{anyhow, Context as _};
use clap::{Subcommand, ValueEnum};
use cycle::CycleClient;
use domain::WorkspaceId;
use graphql::RequestExecutor;
use paging::CollectorOptions;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::CliConfig;
use crate::output::OutputArgs;

use import::ImportTarget;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve the workspace slug to its id.
    Workspace,

    /// Export every company, customer or release of the workspace.
    Export {
        #[arg(value_enum)]
        entity: Entity,

        /// Items requested per page.
        #[arg(long, default_value_t = 50)]
        page_size: u32,

        /// Only export records matching this text (companies and customers).
        #[arg(long)]
        search: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Export the notes of one release.
    ReleaseNotes {
        release_id: String,

        /// Items requested per page.
        #[arg(long, default_value_t = 30)]
        page_size: u32,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Import records from a CSV file.
    Import {
        #[command(subcommand)]
        target: ImportTarget,
    },

    /// Run a raw GraphQL operation from a file and print the full response.
    Query {
        file: PathBuf,

        /// Variables as a JSON object.
        #[arg(long)]
        variables: Option<String>,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Workspace => "workspace",
            Self::Export { .. } => "export",
            Self::ReleaseNotes { .. } => "release-notes",
            Self::Import { .. } => "import",
            Self::Query { .. } => "query",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Entity {
    Companies,
    Customers,
    Releases,
}

/// Everything a command needs, built once per run.
pub struct Context {
    pub config: CliConfig,
    pub client: CycleClient,
    pub cancellation: CancellationToken,
}

impl Context {
    pub fn new(config: CliConfig, cancellation: CancellationToken) -> anyhow::Result<Self> {
        let executor = RequestExecutor::new(config.executor_config()?)
            .context("cannot create the GraphQL executor")?
            .with_cancellation(cancellation.clone());
        Ok(Self {
            config,
            client: CycleClient::new(executor),
            cancellation,
        })
    }

    pub fn collector_options(&self) -> CollectorOptions {
        self.config.collector_options(self.cancellation.clone())
    }

    pub async fn workspace_id(&self) -> anyhow::Result<WorkspaceId> {
        let slug = self.config.workspace_slug()?;
        self.client
            .workspace_id(&slug)
            .await
            .with_context(|| format!("cannot resolve workspace '{slug}'"))?
            .ok_or_else(|| anyhow!("no workspace with slug '{slug}'"))
    }
}

pub async fn run(command: Command, ctx: &Context) -> anyhow::Result<()> {
    match command {
        Command::Workspace => query::workspace(ctx).await,
        Command::Export {
            entity,
            page_size,
            search,
            output,
        } => {
            let written =
                export::export_entity(ctx, entity, page_size, search.as_deref(), &output).await?;
            info!(entity = ?entity, records = written, "export finished");
            Ok(())
        }
        Command::ReleaseNotes {
            release_id,
            page_size,
            output,
        } => {
            let written = export::export_release_notes(ctx, &release_id, page_size, &output).await?;
            info!(release = %release_id, records = written, "release notes exported");
            Ok(())
        }
        Command::Import { target } => {
            let summary = import::run(ctx, &target).await?;
            info!(
                target = target.name(),
                created = summary.created,
                updated = summary.updated,
                deleted = summary.deleted,
                unchanged = summary.unchanged,
                skipped = summary.skipped,
                "import finished"
            );
            Ok(())
        }
        Command::Query { file, variables } => {
            query::raw(ctx, &file, variables.as_deref()).await
        }
    }
}
