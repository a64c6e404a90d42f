//! End-to-end derivation: state -> hierarchy -> resolution -> geometry ->
//! view, plus property checks that hold for arbitrary spans and windows.

use proptest::prelude::*;
use sprintline_core::model::{
    CommittedOverride, Iteration, IterationSpan, LinkKind, WorkItem, WorkItemLink,
};
use sprintline_core::state::{InitialLoad, TimelineAction, TimelineState};
use sprintline_core::window::TeamScope;
use sprintline_grid::{
    Crop, OverrideAffordance, WindowBounds, assemble_view, build_hierarchy, map_to_cell,
};
use std::collections::{HashMap, HashSet};

fn iteration(i: usize, current: bool) -> Iteration {
    Iteration {
        id: format!("s{i}"),
        name: format!("Sprint {i}"),
        path: format!("Project\\s{i}"),
        is_current: current,
        start_date: None,
        finish_date: None,
    }
}

fn item(id: u32, order: f64, path: &str) -> WorkItem {
    WorkItem {
        id,
        title: format!("Item {id}"),
        item_type: "Feature".into(),
        state: "Active".into(),
        in_progress: true,
        order,
        iteration_path: path.to_string(),
    }
}

fn forward(source: u32, target: u32) -> WorkItemLink {
    WorkItemLink {
        source,
        target,
        kind: LinkKind::HierarchyForward,
    }
}

/// Two epics over three features; one feature pinned across the tail of
/// the schedule, one story for rollup.
fn fixture_state() -> TimelineState {
    let mut overrides = HashMap::new();
    overrides.insert(
        12,
        CommittedOverride {
            start_iteration_id: "s4".into(),
            end_iteration_id: "s6".into(),
            user: "casey".into(),
        },
    );

    let mut state = TimelineState::loading(TeamScope {
        project_id: "proj".into(),
        team_id: "team".into(),
    });
    state.apply_initial_load(InitialLoad {
        scope: state.scope.clone(),
        iterations: (1..=6).map(|i| iteration(i, i == 3)).collect(),
        work_items: vec![
            item(1, 1.0, "Project\\s1"),
            item(2, 2.0, "Project\\s1"),
            item(11, 10.0, "Project\\s2"),
            item(12, 11.0, "Project\\s3"),
            item(13, 12.0, "Project\\s4"),
            item(21, 20.0, "Project\\s3"),
        ],
        links: vec![forward(1, 11), forward(1, 12), forward(2, 13), forward(11, 21)],
        current_level_ids: vec![11, 12, 13],
        parent_level_ids: vec![1, 2],
        child_level_ids: vec![21],
        display_options: None,
        committed_overrides: overrides,
    });
    state
}

// ---------------------------------------------------------------------------
// Full pipeline
// ---------------------------------------------------------------------------

#[test]
fn show_all_view_places_every_row() {
    let state = fixture_state();
    let view = assemble_view(&state, &HashSet::new());

    assert!(view.status.is_ready());
    assert_eq!(view.headers.len(), 6);
    // Rows: epic 1, features 11 and 12, epic 2, feature 13.
    let ids: Vec<_> = view.cells.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![1, 11, 12, 2, 13]);
    assert!(view.gaps.is_empty());

    // Epic 1 rolls up s3 (story under 11) .. s6 (pin on 12).
    let epic = view.cells.iter().find(|c| c.id == 1).expect("epic cell");
    assert_eq!(epic.area.column_span, 4);
}

#[test]
fn derivation_is_deterministic() {
    let state = fixture_state();
    let first = assemble_view(&state, &HashSet::new());
    let second = assemble_view(&state, &HashSet::new());
    assert_eq!(first, second);

    let forest_a = build_hierarchy(&state);
    let forest_b = build_hierarchy(&state);
    assert_eq!(forest_a, forest_b);
}

#[test]
fn windowed_view_crops_and_reserves_rows() {
    let mut state = fixture_state();
    state.apply(TimelineAction::DisplayCountChanged { count: 3 });
    let view = assemble_view(&state, &HashSet::new());

    // Window centered on s3: s2..s4.
    assert_eq!(view.headers.len(), 3);
    assert_eq!(view.headers[0].iteration.name, "Sprint 2");

    // The pinned feature (s4..s6) pokes out on the right.
    let pinned = view.cells.iter().find(|c| c.id == 12).expect("pinned");
    assert_eq!(pinned.crop, Crop::Right);
    assert!(!pinned.can_override_right, "cropped edge is not editable");
    assert!(pinned.can_override_left);

    // Epic 1's own row (rollup s2..s6) stays visible and cropped.
    let epic = view.cells.iter().find(|c| c.id == 1).expect("epic");
    assert_eq!(epic.crop, Crop::Right);

    // Every current-level row is either a cell or a reserved gap.
    let placed: HashSet<u32> = view
        .cells
        .iter()
        .map(|c| c.id)
        .chain(view.gaps.iter().map(|g| g.work_item_id))
        .collect();
    for id in [11, 12, 13] {
        assert!(placed.contains(&id), "row {id} placed");
    }
}

#[test]
fn drag_round_trip_leaves_the_view_unchanged() {
    let mut state = fixture_state();
    let before = assemble_view(&state, &HashSet::new());

    state.apply(TimelineAction::OverrideStarted {
        session: sprintline_core::model::OverrideSession {
            work_item_id: 13,
            proposed_start: "s4".into(),
            proposed_end: "s4".into(),
            changing_start: false,
            user: "casey".into(),
            hover: None,
        },
    });
    state.apply(TimelineAction::OverrideHovered {
        iteration_id: "s6".into(),
    });

    let during = assemble_view(&state, &HashSet::new());
    let dragged = during.cells.iter().find(|c| c.id == 13).expect("dragged");
    assert_eq!(dragged.area.column_span, 3, "s4..s6 while dragging");
    assert!(during.work_item_shadow.is_some());

    state.apply(TimelineAction::OverrideEnded);
    let after = assemble_view(&state, &HashSet::new());
    assert_eq!(before, after, "end without commit reverts the view");
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(2000))]

    /// Crop/affordance invariant: Both disables both edges; None leaves
    /// both subject only to the policy gate.
    #[test]
    fn crop_affordance_invariant(
        span_start in 0usize..32,
        span_len in 0usize..16,
        win_start in 0usize..32,
        win_len in 0usize..16,
        allow in any::<bool>(),
    ) {
        let span = IterationSpan::new(span_start, span_start + span_len)
            .expect("constructed ordered");
        let window = WindowBounds { start: win_start, end: win_start + win_len };
        if let Some(cell) = map_to_cell(span, Some(window), 2) {
            let affordance = OverrideAffordance::for_crop(cell.crop, allow);
            match cell.crop {
                Crop::Both => prop_assert!(!affordance.left && !affordance.right),
                Crop::Left => prop_assert!(!affordance.left),
                Crop::Right => prop_assert!(!affordance.right),
                Crop::None => {
                    prop_assert_eq!(affordance.left, allow);
                    prop_assert_eq!(affordance.right, allow);
                }
            }
        }
    }

    /// A rendered cell always fits inside the window and spans >= 1.
    #[test]
    fn rendered_cell_fits_the_window(
        span_start in 0usize..32,
        span_len in 0usize..16,
        win_start in 0usize..32,
        win_len in 0usize..16,
    ) {
        let span = IterationSpan::new(span_start, span_start + span_len)
            .expect("constructed ordered");
        let window = WindowBounds { start: win_start, end: win_start + win_len };
        if let Some(cell) = map_to_cell(span, Some(window), 2) {
            prop_assert!(cell.column_span >= 1);
            prop_assert!(cell.column_start >= 1);
            prop_assert!(cell.column_start + cell.column_span - 1 <= window.width());
        } else {
            // Not rendered only when genuinely disjoint.
            prop_assert!(span.end() < window.start || span.start() > window.end);
        }
    }

    /// Show-all never crops.
    #[test]
    fn show_all_never_crops(span_start in 0usize..64, span_len in 0usize..32) {
        let span = IterationSpan::new(span_start, span_start + span_len)
            .expect("constructed ordered");
        let cell = map_to_cell(span, None, 2).expect("always rendered");
        prop_assert_eq!(cell.crop, Crop::None);
        prop_assert_eq!(cell.column_span, span.len());
    }
}
