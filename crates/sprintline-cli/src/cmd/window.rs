//! `spl window` — inspect the iteration window math for a snapshot.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use sprintline_core::state::TimelineAction;

use crate::output::{self, OutputMode, pretty_kv, pretty_section};
use crate::snapshot;

/// Arguments for `spl window`.
#[derive(Args, Debug)]
pub struct WindowArgs {
    /// Snapshot file with the raw service payloads.
    #[arg(long, value_name = "FILE")]
    pub snapshot: PathBuf,

    /// Persisted-settings file (a stored window is restored first).
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Requested window size, centered on the current sprint.
    #[arg(long)]
    pub count: Option<usize>,

    /// Shift the window left by this many columns.
    #[arg(long, default_value_t = 0, value_name = "N")]
    pub shift_left: usize,

    /// Shift the window right by this many columns.
    #[arg(long, default_value_t = 0, value_name = "N")]
    pub shift_right: usize,
}

/// Compute and print the window options.
pub fn run_window(args: &WindowArgs, output: OutputMode) -> Result<()> {
    let mut state = snapshot::load_state(&args.snapshot, args.settings.as_deref(), None)?;

    if let Some(count) = args.count {
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

    output::render_mode(
        output,
        &state.display_options,
        |options, w| {
            match options {
                Some(o) => writeln!(
                    w,
                    "count={}\tstart={}\tend={}\ttotal={}",
                    o.count, o.start_index, o.end_index, o.total_iterations
                ),
                None => writeln!(w, "all"),
            }
        },
        |options, w| {
            pretty_section(w, "Iteration window")?;
            match options {
                Some(o) => {
                    pretty_kv(w, "count", o.count.to_string())?;
                    pretty_kv(w, "requested", o.original_count.to_string())?;
                    pretty_kv(w, "start index", o.start_index.to_string())?;
                    pretty_kv(w, "end index", o.end_index.to_string())?;
                    pretty_kv(w, "total", o.total_iterations.to_string())?;
                    pretty_kv(
                        w,
                        "shift left",
                        if o.can_shift_left() { "possible" } else { "at edge" },
                    )?;
                    pretty_kv(
                        w,
                        "shift right",
                        if o.can_shift_right() { "possible" } else { "at edge" },
                    )
                }
                None => pretty_kv(w, "window", "all iterations"),
            }
        },
    )
}
