//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Foreground activity and focus tracker.
///
/// Samples the frontmost application on a fixed cadence, folds idle time
/// into sessions, and reports how focused each run was.
#[derive(Debug, Parser)]
#[command(name = "ft", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Track activity until interrupted, then save a run summary.
    Run,

    /// Show the recording session, latest summary and recent timeline.
    Status {
        /// Number of timeline entries to show.
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List activity sessions, newest first.
    Sessions {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List timeline snapshots, newest first.
    Timeline {
        /// Show only the most recent entries.
        #[arg(long)]
        limit: Option<usize>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List application switches, newest first.
    Switches {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List saved run summaries, newest first.
    Summaries {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Summarize a time window and save the result.
    Summarize {
        /// Window start (ISO 8601 or relative, e.g. "2 hours ago").
        #[arg(long)]
        start: String,

        /// Window end (defaults to now).
        #[arg(long)]
        end: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}
