//! `spl hierarchy` — print the derived work item forest with rolled-up
//! spans.

use anyhow::Result;
use clap::Args;
use std::io::{self, Write};
use std::path::PathBuf;

use sprintline_core::model::DurationKind;
use sprintline_core::state::TimelineState;
use sprintline_grid::{WorkItemNode, build_hierarchy, ui_status};

use crate::output::{self, OutputMode, pretty_section};
use crate::snapshot;

/// Arguments for `spl hierarchy`.
#[derive(Args, Debug)]
pub struct HierarchyArgs {
    /// Snapshot file with the raw service payloads.
    #[arg(long, value_name = "FILE")]
    pub snapshot: PathBuf,

    /// Persisted-settings file (pinned overrides affect spans).
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Backlog level to display (defaults to the lowest portfolio tier).
    #[arg(long)]
    pub level: Option<String>,
}

/// Build and print the forest.
pub fn run_hierarchy(args: &HierarchyArgs, output: OutputMode) -> Result<()> {
    let state = snapshot::load_state(
        &args.snapshot,
        args.settings.as_deref(),
        args.level.clone(),
    )?;

    let status = ui_status(&state);
    if !status.is_ready() {
        anyhow::bail!("timeline is not ready: {status:?}");
    }

    let forest = build_hierarchy(&state);
    output::render_mode(
        output,
        &forest,
        |forest, w| {
            for root in forest {
                write_node_text(root, 0, w)?;
            }
            Ok(())
        },
        |forest, w| {
            pretty_section(w, "Work item hierarchy")?;
            for root in forest {
                write_node_pretty(root, 0, &state, w)?;
            }
            Ok(())
        },
    )
}

fn span_label(node: &WorkItemNode, state: &TimelineState) -> String {
    node.duration.visible().map_or_else(
        || "backlog".to_string(),
        |span| {
            let name = |ordinal| {
                state
                    .iterations
                    .get(ordinal)
                    .map_or_else(|| format!("#{ordinal}"), |i| i.name.clone())
            };
            if span.start() == span.end() {
                name(span.start())
            } else {
                format!("{}..{}", name(span.start()), name(span.end()))
            }
        },
    )
}

const fn kind_label(kind: &DurationKind) -> &'static str {
    match kind {
        DurationKind::BacklogIteration => "backlog",
        DurationKind::OwnIteration => "own",
        DurationKind::ChildRollup => "rollup",
        DurationKind::UserOverride { .. } => "pinned",
    }
}

fn write_node_text(node: &WorkItemNode, depth: usize, w: &mut dyn Write) -> io::Result<()> {
    writeln!(
        w,
        "{}{}\t{}\t{}\t{}",
        "\t".repeat(depth),
        node.id(),
        node.item.item_type,
        node.item.title,
        kind_label(&node.duration.kind),
    )?;
    for child in &node.children {
        write_node_text(child, depth + 1, w)?;
    }
    Ok(())
}

fn write_node_pretty(
    node: &WorkItemNode,
    depth: usize,
    state: &TimelineState,
    w: &mut dyn Write,
) -> io::Result<()> {
    writeln!(
        w,
        "{}- #{} [{}] {} — {} ({})",
        "  ".repeat(depth),
        node.id(),
        node.item.item_type,
        node.item.title,
        span_label(node, state),
        kind_label(&node.duration.kind),
    )?;
    for child in &node.children {
        write_node_pretty(child, depth + 1, state, w)?;
    }
    Ok(())
}
