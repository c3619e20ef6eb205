//! Shared contracts for cycle-sync.
//!
//! Every crate in the workspace speaks in the types defined here: the
//! [`Operation`] handed to the request executor, the [`GraphqlResponse`] it
//! decodes, the [`Page`] a page-fetch function yields, the opaque [`Cursor`]
//! threaded between pages, and the [`ExecutionError`] / [`PaginationError`]
//! taxonomy used to report failures.
//!
//! ## Architectural Layer
//!
//! **Contracts + port definitions.** This crate has no I/O dependencies.
//! The [`Transport`] trait describes *what* the executor needs from the
//! network; the `graphql` crate supplies *how*.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`WorkspaceId`, `Cursor`, `SyncRunId`, etc.) |
//! | [`types`] | Value types with invariants (`PageSize`, `Timestamp`) |
//! | [`operation`] | GraphQL request and response shapes |
//! | [`page`] | Pages, page info, and Relay-style connections |
//! | [`errors`] | Execution and pagination errors, retry classification |
//! | [`transport`] | The transport port trait |

pub mod errors;
pub mod identifiers;
pub mod operation;
pub mod page;
pub mod transport;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{ExecutionError, PaginationError, RetryPolicy};
pub use identifiers::{
    CompanyId, Cursor, CustomerId, DocId, ReleaseId, ReleaseNoteId, SyncRunId, WorkspaceId,
    WorkspaceSlug,
};
pub use operation::{
    ExecutionResult, GraphqlError, GraphqlErrorLocation, GraphqlPathSegment, GraphqlResponse,
    Operation,
};
pub use page::{Connection, Edge, Page, PageInfo};
pub use transport::{Transport, TransportResponse};
pub use types::{PageSize, Timestamp};
