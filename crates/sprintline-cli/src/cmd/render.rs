//! `spl render` — derive the grid view from a snapshot and print it.

use anyhow::Result;
use clap::Args;
use std::collections::HashSet;
use std::io::{self, Write};
use std::path::PathBuf;

use sprintline_core::state::{TimelineAction, TimelineState};
use sprintline_grid::{GridView, UiStatus, assemble_sub_grid, assemble_view};

use crate::output::{self, OutputMode, pretty_kv, pretty_section};
use crate::snapshot;

/// Arguments for `spl render`.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Snapshot file with the raw service payloads.
    #[arg(long, value_name = "FILE")]
    pub snapshot: PathBuf,

    /// Persisted-settings file (display window + pinned overrides).
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Backlog level to display (defaults to the lowest portfolio tier).
    #[arg(long)]
    pub level: Option<String>,

    /// Show a fixed iteration window of this size, centered on the
    /// current sprint.
    #[arg(long, conflicts_with = "all")]
    pub count: Option<usize>,

    /// Show every iteration (clears a persisted window).
    #[arg(long)]
    pub all: bool,

    /// Shift the window left by this many columns after computing it.
    #[arg(long, default_value_t = 0, value_name = "N")]
    pub shift_left: usize,

    /// Shift the window right by this many columns after computing it.
    #[arg(long, default_value_t = 0, value_name = "N")]
    pub shift_right: usize,

    /// Collapse these rows (children hidden, rollup span kept).
    #[arg(long, value_delimiter = ',', value_name = "ID,...")]
    pub collapse: Vec<u32>,

    /// Render the detail sub-grid for one work item instead of the main
    /// grid.
    #[arg(long, value_name = "ID")]
    pub sub_grid: Option<u32>,
}

/// Derive and print the grid view.
pub fn run_render(args: &RenderArgs, output: OutputMode) -> Result<()> {
    let mut state = snapshot::load_state(
        &args.snapshot,
        args.settings.as_deref(),
        args.level.clone(),
    )?;
    apply_window_flags(&mut state, args);

    let collapsed: HashSet<u32> = args.collapse.iter().copied().collect();
    let view = match args.sub_grid {
        Some(id) => assemble_sub_grid(&state, id),
        None => assemble_view(&state, &collapsed),
    };

    output::render_mode(output, &view, render_text, render_pretty)
}

fn apply_window_flags(state: &mut TimelineState, args: &RenderArgs) {
    if args.all {
        state.apply(TimelineAction::DisplayAll);
    } else if let Some(count) = args.count {
        state.apply(TimelineAction::DisplayCountChanged { count });
    }
    if args.shift_left > 0 {
        state.apply(TimelineAction::WindowShiftedLeft {
            by: args.shift_left,
        });
    }
    if args.shift_right > 0 {
        state.apply(TimelineAction::WindowShiftedRight {
            by: args.shift_right,
        });
    }
}

// ---------------------------------------------------------------------------
// Renderers
// ---------------------------------------------------------------------------

fn status_line(status: &UiStatus) -> Option<String> {
    match status {
        UiStatus::Ready => None,
        UiStatus::Loading => Some("loading: no data fetched yet".to_string()),
        UiStatus::Error(message) => Some(format!("error: {message}")),
        UiStatus::NoIterations => Some(
            "the team does not have any iteration selected; visit the team admin page".to_string(),
        ),
        UiStatus::NoWorkItems => Some("no in-progress items for the timeline".to_string()),
    }
}

fn render_text(view: &GridView, w: &mut dyn Write) -> io::Result<()> {
    if let Some(line) = status_line(&view.status) {
        return writeln!(w, "{line}");
    }
    for cell in &view.cells {
        writeln!(
            w,
            "{}\t{}\trow={}\tcols={}+{}\tcrop={:?}\tleft={}\tright={}",
            cell.id,
            cell.title,
            cell.area.row,
            cell.area.column,
            cell.area.column_span,
            cell.crop,
            cell.can_override_left,
            cell.can_override_right,
        )?;
    }
    for gap in &view.gaps {
        writeln!(w, "{}\t(gap)\trow={}", gap.work_item_id, gap.area.row)?;
    }
    Ok(())
}

#[allow(clippy::too_many_lines)]
fn render_pretty(view: &GridView, w: &mut dyn Write) -> io::Result<()> {
    if let Some(line) = status_line(&view.status) {
        return writeln!(w, "{line}");
    }

    let columns = view.headers.len();
    let title_width = view
        .cells
        .iter()
        .map(|c| c.title.len().min(32))
        .chain([8])
        .max()
        .unwrap_or(8);

    pretty_section(w, if view.is_sub_grid { "Detail timeline" } else { "Timeline" })?;

    // Header row: iteration names above their columns.
    write!(w, "{:<width$}  ", "", width = title_width + 8)?;
    for header in &view.headers {
        write!(w, "{:^10}", truncate(&header.iteration.name, 10))?;
    }
    writeln!(w)?;

    // One line per row, in row order; gaps render as empty tracks.
    let mut lines: Vec<(usize, String)> = Vec::new();
    for cell in &view.cells {
        let mut track = String::new();
        let first = cell.area.column - 1; // 1-based, after the label column
        let last = first + cell.area.column_span - 1;
        for col in 1..=columns {
            let mark = if col >= first && col <= last {
                match (col == first && cell.crop.left(), col == last && cell.crop.right()) {
                    (true, _) => "◄████████ ",
                    (_, true) => "████████► ",
                    _ => "██████████",
                }
            } else {
                "    ·     "
            };
            track.push_str(mark);
        }
        let marker = if cell.is_root { "▸" } else { " " };
        let mut line = format!(
            "{marker}#{:<6} {:<width$} {track}",
            cell.id,
            truncate(&cell.title, title_width),
            width = title_width
        );
        if let Some(error) = &cell.save_error {
            line.push_str(&format!("  !! {error}"));
        }
        lines.push((cell.area.row, line));
    }
    for gap in &view.gaps {
        let track = "    ·     ".repeat(columns);
        lines.push((
            gap.area.row,
            format!(" #{:<6} {:<width$} {track}", gap.work_item_id, "(off window)", width = title_width),
        ));
    }
    lines.sort_by_key(|(row, _)| *row);
    for (_, line) in lines {
        writeln!(w, "{line}")?;
    }

    writeln!(w)?;
    match &view.window.options {
        Some(options) => {
            let left = if view.window.can_shift_left { "<<" } else { "  " };
            let right = if view.window.can_shift_right { ">>" } else { "  " };
            pretty_kv(
                w,
                "window",
                format!(
                    "{left} {}..{} of {} {right}",
                    options.start_index + 1,
                    options.end_index + 1,
                    options.total_iterations
                ),
            )?;
        }
        None => pretty_kv(w, "window", "all iterations")?,
    }
    if view.work_item_shadow.is_some() {
        pretty_kv(w, "drag", "resize session in progress")?;
    }
    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_strings() {
        assert_eq!(truncate("Sprint 1", 10), "Sprint 1");
    }

    #[test]
    fn truncate_marks_long_strings() {
        let out = truncate("An extremely long feature title", 10);
        assert_eq!(out.chars().count(), 10);
        assert!(out.ends_with('…'));
    }

    #[test]
    fn status_lines_cover_degenerate_states() {
        assert!(status_line(&UiStatus::Ready).is_none());
        assert!(
            status_line(&UiStatus::Error("boom".into()))
                .expect("line")
                .contains("boom")
        );
        assert!(status_line(&UiStatus::NoIterations).is_some());
        assert!(status_line(&UiStatus::NoWorkItems).is_some());
    }
}
