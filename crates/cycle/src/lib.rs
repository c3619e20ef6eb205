//! Cycle GraphQL adapter.
//!
//! [`CycleClient`] turns the Cycle API's Relay connections into
//! [`domain::Page`]s, so each `*_page` method can be handed to a
//! `paging::PageCollector` as its fetch function.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Query documents, variable names and response shapes of
//! the Cycle schema live here and nowhere else. Retries, timeouts and
//! cancellation are the executor's job.

mod client;
mod models;
mod queries;

pub use client::{CycleClient, CYCLE_ENDPOINT};
pub use models::{
    Company, CompanyUpdate, Customer, CustomerCompany, CustomerUpdate, DocRef,
    ExternalCompanyIds, Feedback, NewFeedback, Release, ReleaseNote, ReleaseNoteCover,
};
