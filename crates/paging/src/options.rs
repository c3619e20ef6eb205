use std::time::Duration;

use domain::Cursor;
use tokio_util::sync::CancellationToken;

/// Default cap on the number of pages one run may fetch.
pub const DEFAULT_MAX_PAGES: usize = 10_000;

/// Knobs for one pagination run.
#[derive(Debug, Clone)]
pub struct CollectorOptions {
    /// Cursor passed to the first fetch. Empty by default.
    pub initial_cursor: Cursor,
    /// Maximum number of pages to fetch before failing with
    /// [`domain::PaginationError::PageLimitExceeded`].
    pub max_pages: usize,
    /// Pause between consecutive fetches. Never applied before the first
    /// fetch or after the last one.
    pub inter_page_delay: Option<Duration>,
    /// Stops the run at the next suspension point when cancelled.
    pub cancellation: Option<CancellationToken>,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            initial_cursor: Cursor::initial(),
            max_pages: DEFAULT_MAX_PAGES,
            inter_page_delay: None,
            cancellation: None,
        }
    }
}

impl CollectorOptions {
    /// Starts the run from `cursor` instead of the first page.
    #[must_use]
    pub fn with_initial_cursor(mut self, cursor: impl Into<Cursor>) -> Self {
        self.initial_cursor = cursor.into();
        self
    }

    /// Sets the page cap.
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Sets the pause between pages. A zero duration disables it.
    #[must_use]
    pub fn with_inter_page_delay(mut self, delay: Duration) -> Self {
        self.inter_page_delay = (!delay.is_zero()).then_some(delay);
        self
    }

    /// Ties the run to `token`.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }
}
