//! Override resolver.
//!
//! Merges a work item's stored duration with the single in-flight drag
//! session to produce the span actually displayed. Only the item being
//! dragged is affected; every other item resolves to its stored duration
//! unchanged, which is also what makes an abandoned session harmless.

use sprintline_core::model::{
    IterationDuration, IterationSet, IterationSpan, OverrideSession, WorkItemId,
};
use tracing::debug;

/// Apply the in-flight session (if any) to one item's duration.
///
/// The dragged endpoint is replaced by the session's proposed iteration;
/// the other endpoint keeps the stored value. The dragged endpoint clamps
/// at the fixed one, so the resulting span never inverts and always covers
/// at least one iteration.
///
/// A session whose proposed iteration does not resolve against the current
/// schedule leaves the duration unchanged (silent exclusion).
#[must_use]
pub fn effective_duration(
    work_item_id: WorkItemId,
    stored: &IterationDuration,
    session: Option<&OverrideSession>,
    iterations: &IterationSet,
) -> IterationDuration {
    let Some(session) = session else {
        return stored.clone();
    };
    if session.work_item_id != work_item_id {
        return stored.clone();
    }
    let Some(span) = stored.visible() else {
        // An item without a span has no edge to drag; nothing to merge.
        return stored.clone();
    };

    let proposed_id = if session.changing_start {
        &session.proposed_start
    } else {
        &session.proposed_end
    };
    let Some(proposed) = iterations.ordinal_of(proposed_id) else {
        debug!(work_item_id, proposed_id = %proposed_id, "proposed iteration unknown; session ignored");
        return stored.clone();
    };

    let merged = if session.changing_start {
        IterationSpan::new(proposed.min(span.end()), span.end())
    } else {
        IterationSpan::new(span.start(), proposed.max(span.start()))
    };

    IterationDuration {
        span: merged.or(Some(span)),
        kind: stored.kind.clone(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use sprintline_core::model::{DurationKind, Iteration};

    fn schedule() -> IterationSet {
        IterationSet::new(
            (1..=5)
                .map(|i| Iteration {
                    id: format!("s{i}"),
                    name: format!("S{i}"),
                    path: format!("Project\\s{i}"),
                    is_current: i == 3,
                    start_date: None,
                    finish_date: None,
                })
                .collect(),
        )
    }

    fn stored(start: usize, end: usize) -> IterationDuration {
        IterationDuration {
            span: IterationSpan::new(start, end),
            kind: DurationKind::OwnIteration,
        }
    }

    fn session(id: WorkItemId, changing_start: bool, proposed: &str) -> OverrideSession {
        OverrideSession {
            work_item_id: id,
            proposed_start: if changing_start {
                proposed.to_string()
            } else {
                "s2".to_string()
            },
            proposed_end: if changing_start {
                "s4".to_string()
            } else {
                proposed.to_string()
            },
            changing_start,
            user: "casey".into(),
            hover: None,
        }
    }

    #[test]
    fn no_session_returns_stored_unchanged() {
        let duration = stored(1, 3);
        let resolved = effective_duration(7, &duration, None, &schedule());
        assert_eq!(resolved, duration);
    }

    #[test]
    fn session_for_another_item_is_ignored() {
        let duration = stored(1, 3);
        let s = session(9, true, "s1");
        let resolved = effective_duration(7, &duration, Some(&s), &schedule());
        assert_eq!(resolved, duration);
    }

    #[test]
    fn dragging_start_replaces_only_the_start() {
        let duration = stored(2, 3);
        let s = session(7, true, "s1");
        let resolved = effective_duration(7, &duration, Some(&s), &schedule());
        assert_eq!(resolved.span, IterationSpan::new(0, 3));
        assert_eq!(resolved.kind, DurationKind::OwnIteration);
    }

    #[test]
    fn dragging_end_replaces_only_the_end() {
        let duration = stored(1, 2);
        let s = session(7, false, "s5");
        let resolved = effective_duration(7, &duration, Some(&s), &schedule());
        assert_eq!(resolved.span, IterationSpan::new(1, 4));
    }

    #[test]
    fn dragging_start_past_the_end_clamps_to_a_point() {
        let duration = stored(1, 2);
        let s = session(7, true, "s5");
        let resolved = effective_duration(7, &duration, Some(&s), &schedule());
        assert_eq!(resolved.span, IterationSpan::new(2, 2));
    }

    #[test]
    fn dragging_end_before_the_start_clamps_to_a_point() {
        let duration = stored(3, 4);
        let s = session(7, false, "s1");
        let resolved = effective_duration(7, &duration, Some(&s), &schedule());
        assert_eq!(resolved.span, IterationSpan::new(3, 3));
    }

    #[test]
    fn unknown_proposed_iteration_is_ignored() {
        let duration = stored(1, 3);
        let s = session(7, true, "retired");
        let resolved = effective_duration(7, &duration, Some(&s), &schedule());
        assert_eq!(resolved, duration);
    }

    #[test]
    fn item_without_span_is_left_alone() {
        let duration = IterationDuration::backlog();
        let s = session(7, true, "s1");
        let resolved = effective_duration(7, &duration, Some(&s), &schedule());
        assert_eq!(resolved, duration);
    }
}
