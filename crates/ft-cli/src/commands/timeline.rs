//! Timeline command for listing periodic state snapshots.

use std::io::Write;

use anyhow::Result;
use ft_core::TimelineEntry;
use ft_db::Database;

use super::util::{format_time, truncate};

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let entries = match limit {
        Some(limit) => db.recent_timeline(limit)?,
        None => db.list_timeline()?,
    };
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&entries)?)?;
    } else {
        write_timeline(writer, &entries)?;
    }
    Ok(())
}

pub fn write_timeline<W: Write>(writer: &mut W, entries: &[TimelineEntry]) -> std::io::Result<()> {
    if entries.is_empty() {
        return writeln!(writer, "No timeline entries recorded.");
    }

    writeln!(writer, "{:<19}  {:<16}  Window", "Time", "State")?;
    writeln!(writer, "───────────────────  ────────────────  ──────────────────")?;
    for entry in entries {
        let line = format!(
            "{:<19}  {:<16}  {}",
            format_time(entry.timestamp),
            truncate(entry.label.as_str(), 16),
            truncate(&entry.window_title, 40)
        );
        writeln!(writer, "{}", line.trim_end())?;
    }
    Ok(())
}
