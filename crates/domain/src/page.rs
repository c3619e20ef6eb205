//! Pagination shapes.
//!
//! [`Page`] is what a page-fetch function hands to the collector. [`Connection`]
//! is the Relay-style wire shape (`pageInfo` + `edges[].node`) that Cycle
//! returns; it converts into a [`Page`] without reordering.

use serde::{Deserialize, Serialize};

use crate::identifiers::Cursor;

/// Pagination metadata for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Whether another page follows this one.
    pub has_next_page: bool,
    /// Token for the next page. Ignored when `has_next_page` is false.
    #[serde(default)]
    pub end_cursor: Option<Cursor>,
}

impl PageInfo {
    /// Page info for the final page.
    pub fn last() -> Self {
        Self {
            has_next_page: false,
            end_cursor: None,
        }
    }

    /// Page info announcing a following page reachable through `cursor`.
    pub fn next(cursor: impl Into<Cursor>) -> Self {
        Self {
            has_next_page: true,
            end_cursor: Some(cursor.into()),
        }
    }
}

/// One fetched batch of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items in the order the source returned them.
    pub items: Vec<T>,
    /// Pagination metadata.
    pub page_info: PageInfo,
}

impl<T> Page<T> {
    /// Creates a page.
    pub fn new(items: Vec<T>, page_info: PageInfo) -> Self {
        Self { items, page_info }
    }

    /// Creates the final page.
    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, PageInfo::last())
    }

    /// Creates a page followed by another one at `cursor`.
    pub fn with_next(items: Vec<T>, cursor: impl Into<Cursor>) -> Self {
        Self::new(items, PageInfo::next(cursor))
    }

    /// Number of items on this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` when the page carries no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One edge of a Relay-style connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge<T> {
    /// The entity.
    pub node: T,
    /// Per-edge cursor, when the query selects it.
    #[serde(default)]
    pub cursor: Option<Cursor>,
}

/// Relay-style connection as it appears in a GraphQL response.
///
/// Unknown fields such as `__typename` or `count` are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Connection<T> {
    /// Pagination metadata.
    pub page_info: PageInfo,
    /// Edges in server order.
    #[serde(default = "Vec::new")]
    pub edges: Vec<Edge<T>>,
}

impl<T> From<Connection<T>> for Page<T> {
    fn from(connection: Connection<T>) -> Self {
        Page {
            items: connection.edges.into_iter().map(|edge| edge.node).collect(),
            page_info: connection.page_info,
        }
    }
}
