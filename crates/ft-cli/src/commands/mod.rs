//! CLI subcommand implementations.

pub mod run;
pub mod sessions;
pub mod status;
pub mod summaries;
pub mod summarize;
pub mod switches;
pub mod timeline;
pub mod util;
