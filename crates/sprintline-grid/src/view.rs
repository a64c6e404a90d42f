//! Grid view assembler.
//!
//! Composes hierarchy, override resolution, window math, and geometry into
//! the one structure the presentation layer consumes. Nothing here is
//! stateful: the view is rebuilt from the timeline state on every change.
//!
//! # Grid coordinates
//!
//! CSS-grid style, 1-based. Row 1 is the iteration header; data rows start
//! at 2. Column 1 is the label column (title / parent grouping); iteration
//! columns start at 2. `geometry::map_to_cell` works window-relative and
//! the assembler adds those offsets.

use std::collections::HashSet;

use serde::Serialize;
use sprintline_core::model::{DurationKind, Iteration, IterationId, WorkItemId};
use sprintline_core::state::TimelineState;
use sprintline_core::window::IterationWindowOptions;
use tracing::instrument;

use crate::geometry::{self, Crop, OverrideAffordance, WindowBounds};
use crate::hierarchy::{self, BacklogTier, WorkItemNode};
use crate::resolve;
use crate::status::{self, UiStatus};

/// Number of leading non-iteration columns (the label column).
const LABEL_COLUMNS: usize = 1;
/// First grid row that carries work item cells.
const FIRST_DATA_ROW: usize = 2;

// ---------------------------------------------------------------------------
// View model types
// ---------------------------------------------------------------------------

/// Absolute cell placement, CSS-grid style (1-based, spans inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridArea {
    pub row: usize,
    pub column: usize,
    pub row_span: usize,
    pub column_span: usize,
}

impl GridArea {
    const fn cell(row: usize, column: usize, column_span: usize) -> Self {
        Self {
            row,
            column,
            row_span: 1,
            column_span,
        }
    }
}

/// One labeled header cell per visible iteration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationHeaderCell {
    pub iteration: Iteration,
    pub area: GridArea,
}

/// Drop-target column behind the work item cells; highlighted while a
/// drag session hovers it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadowColumn {
    pub iteration_id: IterationId,
    pub area: GridArea,
    pub hovered: bool,
}

/// Grid-snapped preview of the dragged item's proposed span.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemShadowCell {
    pub work_item_id: WorkItemId,
    pub area: GridArea,
}

/// A rendered work item row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemCell {
    pub id: WorkItemId,
    pub title: String,
    pub item_type: String,
    pub state: String,
    /// Root rows (the grouping tier) render without drag affordances.
    pub is_root: bool,
    pub kind: DurationKind,
    pub area: GridArea,
    pub crop: Crop,
    pub can_override_left: bool,
    pub can_override_right: bool,
    /// Name of the true start iteration, present when the left edge is
    /// cropped (the "starts at …" indicator).
    pub starts_at: Option<String>,
    /// Name of the true end iteration, present when the right edge is
    /// cropped.
    pub ends_at: Option<String>,
    /// Row has child items worth a detail view.
    pub has_details: bool,
    pub saving: bool,
    pub save_error: Option<String>,
}

/// Row reserved for an item with no visible span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GapCell {
    pub work_item_id: WorkItemId,
    pub area: GridArea,
}

/// Window descriptor handed to the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowState {
    pub options: Option<IterationWindowOptions>,
    pub can_shift_left: bool,
    pub can_shift_right: bool,
    pub show_all: bool,
}

/// The complete derived view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridView {
    pub status: UiStatus,
    pub headers: Vec<IterationHeaderCell>,
    pub shadow_columns: Vec<ShadowColumn>,
    pub work_item_shadow: Option<WorkItemShadowCell>,
    pub cells: Vec<WorkItemCell>,
    pub gaps: Vec<GapCell>,
    pub window: WindowState,
    pub hide_parents: bool,
    pub is_sub_grid: bool,
}

impl GridView {
    /// A terminal view for a degenerate state: status only, no partial
    /// rendering.
    #[must_use]
    pub fn degenerate(status: UiStatus) -> Self {
        Self {
            status,
            headers: Vec::new(),
            shadow_columns: Vec::new(),
            work_item_shadow: None,
            cells: Vec::new(),
            gaps: Vec::new(),
            window: WindowState::default(),
            hide_parents: true,
            is_sub_grid: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Assemble the main grid view.
///
/// `collapsed` lists row items whose descendants are hidden; their own
/// rows remain (still spanning the full rollup).
#[must_use]
#[instrument(skip(state, collapsed))]
pub fn assemble_view(state: &TimelineState, collapsed: &HashSet<WorkItemId>) -> GridView {
    let ui = status::ui_status(state);
    if !ui.is_ready() {
        return GridView::degenerate(ui);
    }

    let forest = hierarchy::build_hierarchy(state);
    let mut rows: Vec<&WorkItemNode> = Vec::new();
    for root in &forest {
        push_rows(root, collapsed, &mut rows);
    }
    let hide_parents = !rows.iter().any(|n| n.tier == BacklogTier::Parent);

    assemble(state, ui, &rows, state.display_options.as_ref(), false, hide_parents)
}

/// Assemble the detail (sub-grid) view for one row item: the item itself
/// as the root row plus all of its children, with overrides disabled and
/// the full schedule visible.
#[must_use]
#[instrument(skip(state))]
pub fn assemble_sub_grid(state: &TimelineState, parent_id: WorkItemId) -> GridView {
    let ui = status::ui_status(state);
    if !ui.is_ready() {
        return GridView::degenerate(ui);
    }

    let forest = hierarchy::build_hierarchy(state);
    let Some(node) = hierarchy::find_node(&forest, parent_id) else {
        return GridView::degenerate(UiStatus::NoWorkItems);
    };

    let mut rows: Vec<&WorkItemNode> = vec![node];
    rows.extend(node.children.iter());

    assemble(state, ui, &rows, None, true, true)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Main-grid rows: the grouping tier and the displayed backlog tier.
/// Child-tier nodes feed rollup and the sub-grid only.
fn push_rows<'a>(
    node: &'a WorkItemNode,
    collapsed: &HashSet<WorkItemId>,
    rows: &mut Vec<&'a WorkItemNode>,
) {
    if node.tier == BacklogTier::Child {
        return;
    }
    rows.push(node);
    if collapsed.contains(&node.id()) {
        return;
    }
    for child in &node.children {
        push_rows(child, collapsed, rows);
    }
}

#[allow(clippy::too_many_lines)]
fn assemble(
    state: &TimelineState,
    ui: UiStatus,
    rows: &[&WorkItemNode],
    options: Option<&IterationWindowOptions>,
    sub_grid: bool,
    hide_parents: bool,
) -> GridView {
    let bounds = options.map(WindowBounds::of);
    let (first_visible, width) = bounds.map_or((0, state.iterations.len()), |b| {
        (b.start, b.width())
    });
    let session = state.override_session.as_ref();

    // Header row: one labeled cell per visible iteration.
    let headers: Vec<IterationHeaderCell> = (0..width)
        .filter_map(|offset| state.iterations.get(first_visible + offset))
        .enumerate()
        .map(|(offset, iteration)| IterationHeaderCell {
            iteration: iteration.clone(),
            area: GridArea::cell(1, LABEL_COLUMNS + offset + 1, 1),
        })
        .collect();

    let mut cells: Vec<WorkItemCell> = Vec::with_capacity(rows.len());
    let mut gaps: Vec<GapCell> = Vec::new();
    let mut work_item_shadow: Option<WorkItemShadowCell> = None;

    for (index, node) in rows.iter().enumerate() {
        let row = FIRST_DATA_ROW + index;
        let id = node.id();
        let effective =
            resolve::effective_duration(id, &node.duration, session, &state.iterations);

        let geometry = effective
            .visible()
            .and_then(|span| geometry::map_to_cell(span, bounds, row));
        let Some(geometry) = geometry else {
            // Not visible in this window; the row is still reserved so
            // siblings keep their positions.
            gaps.push(GapCell {
                work_item_id: id,
                area: GridArea::cell(row, LABEL_COLUMNS + 1, width.max(1)),
            });
            continue;
        };

        let area = GridArea::cell(row, LABEL_COLUMNS + geometry.column_start, geometry.column_span);
        let is_root = node.tier == BacklogTier::Parent || (sub_grid && index == 0);
        let allow = !sub_grid && !is_root;
        let affordance = OverrideAffordance::for_crop(geometry.crop, allow);

        if session.is_some_and(|s| s.work_item_id == id) {
            work_item_shadow = Some(WorkItemShadowCell {
                work_item_id: id,
                area,
            });
        }

        let span = effective.visible();
        cells.push(WorkItemCell {
            id,
            title: node.item.title.clone(),
            item_type: node.item.item_type.clone(),
            state: node.item.state.clone(),
            is_root,
            kind: effective.kind.clone(),
            area,
            crop: geometry.crop,
            can_override_left: affordance.left,
            can_override_right: affordance.right,
            starts_at: span.filter(|_| geometry.crop.left()).and_then(|s| {
                state.iterations.get(s.start()).map(|i| i.name.clone())
            }),
            ends_at: span.filter(|_| geometry.crop.right()).and_then(|s| {
                state.iterations.get(s.end()).map(|i| i.name.clone())
            }),
            has_details: !node.children.is_empty(),
            saving: state.saving.contains(&id),
            save_error: state.save_errors.get(&id).cloned(),
        });
    }

    // Drop-target columns behind the rows, highlighted under the drag.
    let data_rows = rows.len().max(1);
    let shadow_columns: Vec<ShadowColumn> = (0..width)
        .filter_map(|offset| state.iterations.get(first_visible + offset))
        .enumerate()
        .map(|(offset, iteration)| ShadowColumn {
            iteration_id: iteration.id.clone(),
            area: GridArea {
                row: FIRST_DATA_ROW,
                column: LABEL_COLUMNS + offset + 1,
                row_span: data_rows,
                column_span: 1,
            },
            hovered: session
                .is_some_and(|s| s.hover.as_deref() == Some(iteration.id.as_str())),
        })
        .collect();

    let window = WindowState {
        options: options.cloned(),
        can_shift_left: options.is_some_and(IterationWindowOptions::can_shift_left),
        can_shift_right: options.is_some_and(IterationWindowOptions::can_shift_right),
        show_all: options.is_none(),
    };

    GridView {
        status: ui,
        headers,
        shadow_columns,
        work_item_shadow,
        cells,
        gaps,
        window,
        hide_parents,
        is_sub_grid: sub_grid,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
