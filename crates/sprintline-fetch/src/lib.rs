#![forbid(unsafe_code)]
//! sprintline-fetch library.
//!
//! Orchestrates the data loading for the timeline: a staged async task
//! over the [`client::WorkTrackingClient`] seam — parallel fan-out, then
//! id-dependent follow-up queries, then a single commit of everything into
//! the timeline state. A failure at any stage aborts the remainder and
//! surfaces exactly one terminal error; the store is never partially
//! populated.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` transport errors at the seam, mapped into the
//!   core taxonomy (`FetchError`, `SaveError`) with messages preserved
//!   verbatim.
//! - **Logging**: `tracing` with `#[instrument]` on the task entry points
//!   and `debug!` per stage.

pub mod client;
pub mod fixture;
pub mod initialize;
pub mod payload;
pub mod save;

pub use client::{LinkDirection, TransportError, WorkTrackingClient};
pub use fixture::{FixtureClient, Snapshot};
pub use initialize::{InitializeOptions, initialize, initialize_state};
pub use payload::{
    BacklogConfiguration, BacklogLevelRecord, IterationRecord, LinkRecord, MetaState,
    WorkItemRecord, WorkItemTypeStates,
};
pub use save::{commit_move, commit_pin};
