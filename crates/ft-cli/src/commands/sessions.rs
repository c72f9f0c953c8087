//! Sessions command for listing activity sessions.

use std::io::Write;

use anyhow::Result;
use ft_core::SessionRecord;
use ft_db::Database;

use super::util::{format_duration, format_time, truncate};

pub fn run<W: Write>(writer: &mut W, db: &Database, json: bool) -> Result<()> {
    let sessions = db.list_sessions()?;
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&sessions)?)?;
    } else {
        write_sessions(writer, &sessions)?;
    }
    Ok(())
}

/// Writes sessions as a table, in the order given.
pub fn write_sessions<W: Write>(writer: &mut W, sessions: &[SessionRecord]) -> std::io::Result<()> {
    if sessions.is_empty() {
        return writeln!(writer, "No sessions recorded.");
    }

    write_row(writer, ["ID", "Label", "Start", "Duration", "State", "Window"])?;
    writeln!(
        writer,
        "────  ────────────────  ───────────────────  ────────  ──────  ──────────────────"
    )?;
    for session in sessions {
        write_row(
            writer,
            [
                session.id.get().to_string().as_str(),
                truncate(session.label.as_str(), 16).as_str(),
                format_time(session.start_time).as_str(),
                format_duration(session.duration_seconds).as_str(),
                if session.is_open { "open" } else { "closed" },
                truncate(&session.window_title, 40).as_str(),
            ],
        )?;
    }
    Ok(())
}

fn write_row<W: Write>(
    writer: &mut W,
    [id, label, start, duration, state, window]: [&str; 6],
) -> std::io::Result<()> {
    let line = format!("{id:<4}  {label:<16}  {start:<19}  {duration:>8}  {state:<6}  {window}");
    writeln!(writer, "{}", line.trim_end())
}
