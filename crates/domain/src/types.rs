//! Shared value types.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! values with invariants (page sizes are bounded, timestamps are UTC).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Page size
// ---------------------------------------------------------------------------

/// Number of items requested per page.
///
/// The Cycle API rejects sizes outside `1..=MAX`; the bound is enforced at
/// construction so a bad CLI flag fails before the first request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PageSize(u32);

impl PageSize {
    /// Largest page the API serves in one response.
    pub const MAX: u32 = 1000;

    /// Creates a [`PageSize`], returning `None` if `size` is zero or above [`Self::MAX`].
    #[must_use]
    pub fn new(size: u32) -> Option<Self> {
        if (1..=Self::MAX).contains(&size) {
            Some(Self(size))
        } else {
            None
        }
    }

    /// Returns the size as a `u32`.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(50)
    }
}

impl std::fmt::Display for PageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<PageSize> for serde_json::Value {
    fn from(size: PageSize) -> Self {
        serde_json::Value::from(size.0)
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly. Serialises as RFC 3339, which is what the Cycle API emits for
/// `DateTime` scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
