//! Summaries command for listing saved run summaries.

use std::io::Write;

use anyhow::Result;
use ft_core::SessionSummary;
use ft_db::Database;

use super::util::{format_duration, format_time};

pub fn run<W: Write>(writer: &mut W, db: &Database, json: bool) -> Result<()> {
    let summaries = db.list_summaries()?;
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&summaries)?)?;
    } else {
        write_summaries(writer, &summaries)?;
    }
    Ok(())
}

pub fn write_summaries<W: Write>(
    writer: &mut W,
    summaries: &[SessionSummary],
) -> std::io::Result<()> {
    if summaries.is_empty() {
        return writeln!(writer, "No summaries saved.");
    }

    writeln!(
        writer,
        "{:<4}  {:<19}  {:<19}  {:>8}  {:>8}  {:>8}  {:>6}",
        "ID", "Start", "End", "Active", "Idle", "Switches", "Focus"
    )?;
    writeln!(
        writer,
        "────  ───────────────────  ───────────────────  ────────  ────────  ────────  ──────"
    )?;
    for summary in summaries {
        let id = summary.id.map_or_else(|| "-".to_string(), |id| id.to_string());
        writeln!(
            writer,
            "{:<4}  {:<19}  {:<19}  {:>8}  {:>8}  {:>8}  {:>6}",
            id,
            format_time(summary.start_time),
            format_time(summary.end_time),
            format_duration(summary.total_active_seconds),
            format_duration(summary.total_idle_seconds),
            summary.app_switches,
            format!("{:.1}%", summary.focus_score)
        )?;
    }
    Ok(())
}

/// Writes one summary as a labelled block.
pub fn write_summary<W: Write>(writer: &mut W, summary: &SessionSummary) -> std::io::Result<()> {
    writeln!(
        writer,
        "Window:   {} to {}",
        format_time(summary.start_time),
        format_time(summary.end_time)
    )?;
    writeln!(writer, "Active:   {}", format_duration(summary.total_active_seconds))?;
    writeln!(writer, "Idle:     {}", format_duration(summary.total_idle_seconds))?;
    writeln!(writer, "Switches: {}", summary.app_switches)?;
    writeln!(writer, "Focus:    {:.1}%", summary.focus_score)
}
