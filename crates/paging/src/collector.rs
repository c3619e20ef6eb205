//! The pagination loop.

use std::future::Future;
use std::time::Duration;

use domain::{Cursor, ExecutionError, Page, PaginationError};
use futures::stream::{self, Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::options::CollectorOptions;

/// Where a collector is in its run.
///
/// `Done` and `Failed` are terminal: a finished collector never fetches again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    /// Nothing fetched yet.
    Idle,
    /// Waiting on the fetch of `page`.
    Fetching { page: usize },
    /// `page` has been delivered and another page follows.
    Accumulating { page: usize },
    /// The last page has been delivered.
    Done,
    /// The run stopped on an error.
    Failed,
}

impl CollectorState {
    /// Returns `true` for `Done` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Drives a page-fetch function through successive cursors.
///
/// `fetch` receives the cursor for the page to load and returns that page.
/// Pages are fetched strictly one after another; items keep fetch order and
/// are never deduplicated.
pub struct PageCollector<F> {
    fetch: F,
    options: CollectorOptions,
    state: CollectorState,
    cursor: Cursor,
    pages_fetched: usize,
    pending_failure: Option<PaginationError>,
}

impl<F> std::fmt::Debug for PageCollector<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageCollector")
            .field("state", &self.state)
            .field("cursor", &self.cursor)
            .field("pages_fetched", &self.pages_fetched)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<F> PageCollector<F> {
    /// Creates an idle collector positioned at the options' initial cursor.
    pub fn new(fetch: F, options: CollectorOptions) -> Self {
        let cursor = options.initial_cursor.clone();
        Self {
            fetch,
            options,
            state: CollectorState::Idle,
            cursor,
            pages_fetched: 0,
            pending_failure: None,
        }
    }

    /// Current position in the run.
    pub fn state(&self) -> CollectorState {
        self.state
    }

    /// Number of pages fetched successfully so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Fetches the next page and returns its items.
    ///
    /// Returns `None` once the collector is `Done` or `Failed`. An error is
    /// returned exactly once; every later call returns `None`.
    pub async fn next_page<T, Fut>(&mut self) -> Option<Result<Vec<T>, PaginationError>>
    where
        F: FnMut(Cursor) -> Fut,
        Fut: Future<Output = Result<Page<T>, ExecutionError>>,
    {
        if self.state.is_terminal() {
            return None;
        }
        if let Some(failure) = self.pending_failure.take() {
            return Some(Err(self.fail(failure)));
        }

        let page = self.pages_fetched + 1;
        if self.pages_fetched >= self.options.max_pages {
            return Some(Err(self.fail(PaginationError::PageLimitExceeded {
                max_pages: self.options.max_pages,
            })));
        }
        if self.is_cancelled() {
            return Some(Err(self.fail(PaginationError::Cancelled { page })));
        }
        if self.pages_fetched > 0 {
            if let Some(delay) = self.options.inter_page_delay {
                if self.pause(delay).await.is_err() {
                    return Some(Err(self.fail(PaginationError::Cancelled { page })));
                }
            }
        }

        self.state = CollectorState::Fetching { page };
        let cursor = self.cursor.clone();
        debug!(page, cursor = %cursor, "fetching page");
        let fetched = self.run_fetch::<T, Fut>(cursor.clone()).await;

        let Page { items, page_info } = match fetched {
            Ok(fetched) => fetched,
            Err(source) if source.is_cancelled() => {
                return Some(Err(self.fail(PaginationError::Cancelled { page })));
            }
            Err(source) => {
                return Some(Err(self.fail(PaginationError::Fetch {
                    page,
                    cursor,
                    source,
                })));
            }
        };

        self.pages_fetched = page;
        debug!(
            page,
            items = items.len(),
            has_next_page = page_info.has_next_page,
            "page fetched"
        );

        if !page_info.has_next_page {
            self.state = CollectorState::Done;
            info!(pages = page, "pagination finished");
            return Some(Ok(items));
        }

        match page_info.end_cursor.filter(|next| !next.is_empty()) {
            Some(next) => self.cursor = next,
            // Deliver this page, then fail instead of re-requesting the same cursor.
            None => self.pending_failure = Some(PaginationError::MissingCursor { page }),
        }
        self.state = CollectorState::Accumulating { page };
        Some(Ok(items))
    }

    /// Runs to completion and returns every item in fetch order.
    ///
    /// On failure the items gathered so far are discarded.
    pub async fn collect_all<T, Fut>(mut self) -> Result<Vec<T>, PaginationError>
    where
        F: FnMut(Cursor) -> Fut,
        Fut: Future<Output = Result<Page<T>, ExecutionError>>,
    {
        let mut collected = Vec::new();
        while let Some(items) = self.next_page::<T, Fut>().await {
            collected.extend(items?);
        }
        Ok(collected)
    }

    /// Turns the collector into a stream of items.
    ///
    /// Items of each page are yielded as soon as the page arrives. A failure
    /// is yielded once, after every item delivered before it, and ends the
    /// stream.
    pub fn into_stream<T, Fut>(self) -> impl Stream<Item = Result<T, PaginationError>>
    where
        F: FnMut(Cursor) -> Fut,
        Fut: Future<Output = Result<Page<T>, ExecutionError>>,
    {
        stream::unfold(self, |mut collector| async move {
            let batch = collector.next_page::<T, Fut>().await?;
            Some((batch, collector))
        })
        .flat_map(|batch| {
            let items: Vec<Result<T, PaginationError>> = match batch {
                Ok(items) => items.into_iter().map(Ok).collect(),
                Err(err) => vec![Err(err)],
            };
            stream::iter(items)
        })
        .fuse()
    }

    async fn run_fetch<T, Fut>(&mut self, cursor: Cursor) -> Result<Page<T>, ExecutionError>
    where
        F: FnMut(Cursor) -> Fut,
        Fut: Future<Output = Result<Page<T>, ExecutionError>>,
    {
        let fetch = (self.fetch)(cursor);
        match &self.options.cancellation {
            Some(token) => tokio::select! {
                biased;
                () = token.cancelled() => Err(ExecutionError::Cancelled),
                result = fetch => result,
            },
            None => fetch.await,
        }
    }

    async fn pause(&self, delay: Duration) -> Result<(), ExecutionError> {
        match &self.options.cancellation {
            Some(token) => tokio::select! {
                biased;
                () = token.cancelled() => Err(ExecutionError::Cancelled),
                () = tokio::time::sleep(delay) => Ok(()),
            },
            None => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.options
            .cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }

    fn fail(&mut self, error: PaginationError) -> PaginationError {
        warn!(pages_fetched = self.pages_fetched, error = %error, "pagination stopped");
        self.state = CollectorState::Failed;
        error
    }
}

/// Collects every item reachable from `initial_cursor`.
///
/// Shorthand for a [`PageCollector`] built from `options` with its initial
/// cursor replaced.
pub async fn collect_all_pages<T, F, Fut>(
    fetch: F,
    initial_cursor: Cursor,
    options: CollectorOptions,
) -> Result<Vec<T>, PaginationError>
where
    F: FnMut(Cursor) -> Fut,
    Fut: Future<Output = Result<Page<T>, ExecutionError>>,
{
    PageCollector::new(fetch, options.with_initial_cursor(initial_cursor))
        .collect_all()
        .await
}
