#![forbid(unsafe_code)]
//! sprintline-grid library.
//!
//! The derivation layer between the timeline state and the presentation:
//! a pipeline of pure functions recomputed on every relevant state change.
//!
//! ```text
//! TimelineState
//!        ↓  hierarchy::build_hierarchy()
//! Vec<WorkItemNode> (forest, spans rolled up bottom-up)
//!        ↓  resolve::effective_duration()     (per item, drag session applied)
//!        ↓  geometry::map_to_cell()           (window intersection, crop)
//!        ↓  view::assemble_view()
//! GridView (headers, cells, gaps, shadows, window descriptor)
//! ```
//!
//! Everything here is referentially transparent: same state in, same view
//! out. Recomputation is always safe to repeat; callers may memoize by
//! input equality but nothing depends on it.
//!
//! # Conventions
//!
//! - **Errors**: none cross this boundary. Malformed upstream data
//!   (dangling links, unknown iteration ids) is logged via `tracing` and
//!   excluded, per the partial-data robustness policy.
//! - **Logging**: `debug!` for every silent exclusion, `#[instrument]` on
//!   the pipeline entry points.

pub mod geometry;
pub mod hierarchy;
pub mod resolve;
pub mod status;
pub mod view;

pub use geometry::{CellGeometry, Crop, OverrideAffordance, WindowBounds, map_to_cell};
pub use hierarchy::{BacklogTier, WorkItemNode, build_hierarchy, find_node};
pub use resolve::effective_duration;
pub use status::{UiStatus, ui_status};
pub use view::{
    GapCell, GridArea, GridView, IterationHeaderCell, ShadowColumn, WindowState, WorkItemCell,
    WorkItemShadowCell, assemble_sub_grid, assemble_view,
};
