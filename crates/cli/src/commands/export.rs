use std::future::Future;
use std::io::Write;
use std::pin::pin;

use anyhow::Context as _;
use domain::{Cursor, ExecutionError, Page, PageSize, ReleaseId};
use futures::StreamExt;
use paging::{CollectorOptions, PageCollector};
use serde::Serialize;
use tracing::{info_span, warn, Instrument};

use super::{Context, Entity};
use crate::output::{self, Format, OutputArgs, Tabular};

pub async fn export_entity(
    ctx: &Context,
    entity: Entity,
    page_size: u32,
    search: Option<&str>,
    output: &OutputArgs,
) -> anyhow::Result<usize> {
    let size = page_size_arg(page_size)?;
    let workspace = ctx.workspace_id().await?;
    let client = &ctx.client;
    let workspace = &workspace;
    let options = ctx.collector_options();
    let span = info_span!("export", entity = ?entity, workspace = %workspace);

    match entity {
        Entity::Companies => {
            deliver(options, output, move |cursor| {
                client.companies_page(workspace, cursor, size, search)
            })
            .instrument(span)
            .await
        }
        Entity::Customers => {
            deliver(options, output, move |cursor| {
                client.customers_page(workspace, cursor, size, search)
            })
            .instrument(span)
            .await
        }
        Entity::Releases => {
            if search.is_some() {
                warn!("--search does not apply to releases and is ignored");
            }
            deliver(options, output, move |cursor| {
                client.releases_page(workspace, cursor, size)
            })
            .instrument(span)
            .await
        }
    }
}

pub async fn export_release_notes(
    ctx: &Context,
    release_id: &str,
    page_size: u32,
    output: &OutputArgs,
) -> anyhow::Result<usize> {
    let size = page_size_arg(page_size)?;
    let release = ReleaseId::new(release_id).context("release id must not be empty")?;
    let client = &ctx.client;
    let release = &release;
    let span = info_span!("export", entity = "release-notes", release = %release);

    deliver(ctx.collector_options(), output, move |cursor| {
        client.release_notes_page(release, cursor, size)
    })
    .instrument(span)
    .await
}

fn page_size_arg(page_size: u32) -> anyhow::Result<PageSize> {
    PageSize::new(page_size)
        .with_context(|| format!("--page-size must be between 1 and {}", PageSize::MAX))
}

/// Runs the collector and writes what it yields to `output`.
async fn deliver<T, F, Fut>(
    options: CollectorOptions,
    output: &OutputArgs,
    fetch: F,
) -> anyhow::Result<usize>
where
    T: Serialize + Tabular,
    F: FnMut(Cursor) -> Fut,
    Fut: Future<Output = Result<Page<T>, ExecutionError>>,
{
    let path = output.output.as_deref();
    deliver_to(options, output.format, || output::open(path), fetch).await
}

/// NDJSON is written item by item as pages arrive. The other formats wait
/// for the whole listing, and `open` is not called unless every page arrived.
async fn deliver_to<T, W, O, F, Fut>(
    options: CollectorOptions,
    format: Format,
    open: O,
    fetch: F,
) -> anyhow::Result<usize>
where
    T: Serialize + Tabular,
    W: Write,
    O: FnOnce() -> anyhow::Result<W>,
    F: FnMut(Cursor) -> Fut,
    Fut: Future<Output = Result<Page<T>, ExecutionError>>,
{
    let collector = PageCollector::new(fetch, options);

    if format == Format::Ndjson {
        let mut writer = open()?;
        let mut stream = pin!(collector.into_stream());
        let mut written = 0;
        while let Some(item) = stream.next().await {
            let item = match item {
                Ok(item) => item,
                Err(err) => {
                    writer.flush()?;
                    return Err(err.into());
                }
            };
            output::write_line(&mut writer, &item)?;
            written += 1;
        }
        writer.flush()?;
        return Ok(written);
    }

    let items = collector.collect_all().await?;
    let mut writer = open()?;
    output::write_batch(&mut writer, format, &items)?;
    Ok(items.len())
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use cycle::Release;
    use domain::PaginationError;
    use serde_json::json;

    use super::*;

    fn release(id: &str) -> Release {
        serde_json::from_value(json!({"id": id, "title": id})).unwrap()
    }

    // Page 1 holds r1 and r2 and points at "c1"; fetching "c1" fails.
    async fn second_page_fails(cursor: Cursor) -> Result<Page<Release>, ExecutionError> {
        if cursor.is_empty() {
            Ok(Page::with_next(vec![release("r1"), release("r2")], "c1"))
        } else {
            Err(ExecutionError::HttpStatus {
                status: 500,
                body: "boom".to_string(),
                retry_after: None,
            })
        }
    }

    async fn run_failing(format: Format) -> (anyhow::Error, Vec<u8>, bool) {
        let mut buffer = Vec::new();
        let opened = Cell::new(false);
        let (sink, flag) = (&mut buffer, &opened);
        let err = deliver_to(
            CollectorOptions::default(),
            format,
            move || {
                flag.set(true);
                Ok(sink)
            },
            second_page_fails,
        )
        .await
        .unwrap_err();
        (err, buffer, opened.get())
    }

    fn fetch_error_page(err: &anyhow::Error) -> Option<usize> {
        err.downcast_ref::<PaginationError>()
            .and_then(PaginationError::page)
    }

    #[tokio::test]
    async fn json_writes_nothing_when_a_later_page_fails() {
        let (err, buffer, opened) = run_failing(Format::Json).await;
        assert_eq!(fetch_error_page(&err), Some(2));
        assert!(!opened);
        assert!(buffer.is_empty());
    }

    #[tokio::test]
    async fn csv_writes_nothing_when_a_later_page_fails() {
        let (err, buffer, opened) = run_failing(Format::Csv).await;
        assert_eq!(fetch_error_page(&err), Some(2));
        assert!(!opened);
        assert!(buffer.is_empty());
    }

    #[tokio::test]
    async fn ndjson_has_written_the_first_page_when_a_later_page_fails() {
        let (err, buffer, opened) = run_failing(Format::Ndjson).await;
        assert_eq!(fetch_error_page(&err), Some(2));
        assert!(opened);
        let lines: Vec<serde_json::Value> = String::from_utf8(buffer)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["id"], "r1");
        assert_eq!(lines[1]["id"], "r2");
    }

    #[tokio::test]
    async fn a_failed_json_export_leaves_an_existing_file_untouched() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "previous export\n").unwrap();
        let output = OutputArgs {
            format: Format::Json,
            output: Some(file.path().to_path_buf()),
        };

        deliver(CollectorOptions::default(), &output, second_page_fails)
            .await
            .unwrap_err();

        assert_eq!(
            std::fs::read_to_string(file.path()).unwrap(),
            "previous export\n"
        );
    }

    #[tokio::test]
    async fn complete_listing_is_written_as_csv() {
        let mut buffer = Vec::new();
        let sink = &mut buffer;
        let written = deliver_to(
            CollectorOptions::default(),
            Format::Csv,
            move || Ok(sink),
            |_cursor: Cursor| async { Ok::<_, ExecutionError>(Page::last(vec![release("r1")])) },
        )
        .await
        .unwrap();

        assert_eq!(written, 1);
        assert_eq!(String::from_utf8(buffer).unwrap(), "id,title,date\nr1,r1,\n");
    }
}
