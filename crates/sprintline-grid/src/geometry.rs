//! Grid geometry mapper.
//!
//! Maps an effective iteration span and the visible window to a cell's
//! column coordinates plus a crop classification. Columns here are
//! **window-relative and 1-based**; the assembler adds the label-column
//! offset when it builds absolute grid areas.
//!
//! A cropped edge is not the item's true boundary, so it must never be
//! editable from this view: the affordance derivation below is the single
//! place that rule lives.

use serde::Serialize;
use sprintline_core::model::IterationSpan;
use sprintline_core::window::IterationWindowOptions;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How a rendered span is truncated by the visible window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Crop {
    #[default]
    None,
    Left,
    Right,
    Both,
}

impl Crop {
    #[must_use]
    pub const fn left(self) -> bool {
        matches!(self, Self::Left | Self::Both)
    }

    #[must_use]
    pub const fn right(self) -> bool {
        matches!(self, Self::Right | Self::Both)
    }
}

/// Inclusive ordinal bounds of the visible window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBounds {
    pub start: usize,
    pub end: usize,
}

impl WindowBounds {
    #[must_use]
    pub const fn of(options: &IterationWindowOptions) -> Self {
        Self {
            start: options.start_index,
            end: options.end_index,
        }
    }

    #[must_use]
    pub const fn width(self) -> usize {
        self.end - self.start + 1
    }
}

/// A cell's position in the grid, window-relative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellGeometry {
    /// 1-based column within the visible iteration columns.
    pub column_start: usize,
    /// Number of columns covered, always >= 1.
    pub column_span: usize,
    /// Grid row this cell was laid out on.
    pub row: usize,
    pub crop: Crop,
}

/// Which edges may be drag-resized, after crop and policy are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideAffordance {
    pub left: bool,
    pub right: bool,
}

impl OverrideAffordance {
    /// Derive the affordance from the crop classification.
    ///
    /// `allow` is the caller's policy gate (sub-grids and root rows pass
    /// `false`). A cropped edge is forced off regardless of policy.
    #[must_use]
    pub const fn for_crop(crop: Crop, allow: bool) -> Self {
        Self {
            left: allow && !crop.left(),
            right: allow && !crop.right(),
        }
    }
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

/// Map a span onto the visible window.
///
/// With no window (show-all) the mapping is 1:1 and never crops. With a
/// window, the span is intersected with it: an empty intersection returns
/// `None` (the caller still reserves the row), and a partial overlap
/// clamps to the window edge and reports the crop.
#[must_use]
pub fn map_to_cell(
    span: IterationSpan,
    window: Option<WindowBounds>,
    row: usize,
) -> Option<CellGeometry> {
    let Some(window) = window else {
        return Some(CellGeometry {
            column_start: span.start() + 1,
            column_span: span.len(),
            row,
            crop: Crop::None,
        });
    };

    if span.end() < window.start || span.start() > window.end {
        return None;
    }

    let cropped_left = span.start() < window.start;
    let cropped_right = span.end() > window.end;
    let crop = match (cropped_left, cropped_right) {
        (false, false) => Crop::None,
        (true, false) => Crop::Left,
        (false, true) => Crop::Right,
        (true, true) => Crop::Both,
    };

    let clamped_start = span.start().max(window.start);
    let clamped_end = span.end().min(window.end);

    Some(CellGeometry {
        column_start: clamped_start - window.start + 1,
        column_span: clamped_end - clamped_start + 1,
        row,
        crop,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
