#![forbid(unsafe_code)]

mod cmd;
mod output;
mod snapshot;

use clap::{CommandFactory, Parser, Subcommand};
use output::OutputMode;
use std::env;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "spl: sprint timeline grids from work-tracking snapshots",
    long_about = None
)]
struct Cli {
    /// Output format (default: pretty on a TTY, text when piped).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Derive and print the timeline grid",
        long_about = "Load a snapshot, run the initialize sequence, derive the grid view, and print it.",
        after_help = "EXAMPLES:\n    # Full grid, every iteration\n    spl render --snapshot team.json --all\n\n    # Three sprints centered on the current one, then one step right\n    spl render --snapshot team.json --count 3 --shift-right 1\n\n    # Detail view for one work item\n    spl render --snapshot team.json --sub-grid 11\n\n    # Machine-readable view model\n    spl render --snapshot team.json --json"
    )]
    Render(cmd::render::RenderArgs),

    #[command(
        about = "Print the work item forest with rolled-up spans",
        after_help = "EXAMPLES:\n    spl hierarchy --snapshot team.json\n    spl hierarchy --snapshot team.json --level Epics --json"
    )]
    Hierarchy(cmd::hierarchy::HierarchyArgs),

    #[command(
        about = "Inspect the iteration window math",
        after_help = "EXAMPLES:\n    spl window --snapshot team.json --count 5\n    spl window --snapshot team.json --count 3 --shift-right 2"
    )]
    Window(cmd::window::WindowArgs),

    #[command(about = "Generate shell completions")]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SPRINTLINE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "sprintline=debug,info"
        } else {
            "sprintline=info,warn"
        })
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let output = output::resolve_output_mode(cli.format, cli.json);

    match cli.command {
        Commands::Render(ref args) => cmd::render::run_render(args, output),
        Commands::Hierarchy(ref args) => cmd::hierarchy::run_hierarchy(args, output),
        Commands::Window(ref args) => cmd::window::run_window(args, output),
        Commands::Completions(args) => {
            cmd::completions::run_completions(args.shell, &mut Cli::command())
        }
    }
}
