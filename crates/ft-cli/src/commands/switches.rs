//! Switches command for listing state changes.

use std::io::Write;

use anyhow::Result;
use ft_core::SwitchEvent;
use ft_db::Database;

use super::util::{format_time, truncate};

pub fn run<W: Write>(writer: &mut W, db: &Database, json: bool) -> Result<()> {
    let switches = db.list_switches()?;
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&switches)?)?;
    } else {
        write_switches(writer, &switches)?;
    }
    Ok(())
}

pub fn write_switches<W: Write>(writer: &mut W, switches: &[SwitchEvent]) -> std::io::Result<()> {
    if switches.is_empty() {
        return writeln!(writer, "No switches recorded.");
    }

    writeln!(writer, "{:<19}  {:<16}  To", "Time", "From")?;
    writeln!(writer, "───────────────────  ────────────────  ────────────────")?;
    for switch in switches {
        // A run's first switch has no origin.
        let from = switch.from.as_ref().map_or("(start)", |label| label.as_str());
        writeln!(
            writer,
            "{:<19}  {:<16}  {}",
            format_time(switch.timestamp),
            truncate(from, 16),
            switch.to
        )?;
    }
    Ok(())
}
