#![forbid(unsafe_code)]
//! sprintline-core library.
//!
//! Domain model and state for the sprint timeline view: work items and
//! their links, the ordered team iteration schedule, iteration spans and
//! overrides, the visible-window math, and the timeline state record with
//! its action API.
//!
//! # Conventions
//!
//! - **Errors**: library enums use `thiserror`; the settings store returns
//!   `anyhow::Result` with context.
//! - **Logging**: use `tracing` macros (`info!`, `warn!`, `error!`,
//!   `debug!`, `trace!`). Malformed upstream data is logged and skipped,
//!   never raised.

pub mod error;
pub mod model;
pub mod settings;
pub mod state;
pub mod window;

pub use error::{ConfigurationError, ErrorCode, FetchError, FetchStage, SaveError};
pub use settings::{JsonFileStore, MemoryStore, SettingsStore};
pub use model::{
    CommittedOverride, DurationKind, Iteration, IterationDuration, IterationId, IterationSet,
    IterationSpan, LinkKind, OverrideSession, WorkItem, WorkItemId, WorkItemLink,
};
pub use state::{InitialLoad, TimelineAction, TimelineState};
pub use window::{IterationWindowOptions, TeamScope, WindowRequest};
