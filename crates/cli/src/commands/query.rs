use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context as _};
use domain::{GraphqlResponse, Operation};
use serde_json::{json, Value};
use tracing::warn;

use super::Context;

/// Prints `{"slug": ..., "id": ...}` for the configured workspace.
pub async fn workspace(ctx: &Context) -> anyhow::Result<()> {
    let slug = ctx.config.workspace_slug()?;
    let id = ctx.workspace_id().await?;
    print_json(&json!({"slug": slug.as_str(), "id": id.as_str()}))
}

/// Runs the operation in `file` and prints the whole response.
///
/// A response carrying GraphQL errors is printed too, then reported as a
/// failure.
pub async fn raw(ctx: &Context, file: &Path, variables: Option<&str>) -> anyhow::Result<()> {
    let document = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("cannot read operation file {}", file.display()))?;
    if document.trim().is_empty() {
        bail!("operation file {} is empty", file.display());
    }

    let mut operation = Operation::new(document);
    if let Some(variables) = variables {
        let parsed: Value =
            serde_json::from_str(variables).context("--variables is not valid JSON")?;
        operation = operation.with_variables_object(parsed)?;
    }

    let response: GraphqlResponse<Value> = ctx.client.executor().execute(&operation).await?;
    print_json(&response)?;

    if !response.errors.is_empty() {
        warn!(errors = response.errors.len(), "response contains GraphQL errors");
        bail!(
            "the operation returned {} GraphQL error(s)",
            response.errors.len()
        );
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}
