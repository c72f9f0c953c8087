//! Summarize command: aggregates an arbitrary window and saves the result.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use ft_db::Database;

use super::summaries::write_summary;

pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    json: bool,
) -> Result<()> {
    if end < start {
        anyhow::bail!("summary window ends before it starts: {start} > {end}");
    }

    let summary = ft_core::summarize(db, start, end).context("failed to summarize window")?;
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&summary)?)?;
    } else {
        write_summary(writer, &summary)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone};
    use ft_core::{NewSession, SessionUpdate, StateLabel, SwitchEvent};
    use insta::assert_snapshot;

    use super::*;

    fn at(offset: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap() + TimeDelta::seconds(offset)
    }

    fn open(label: StateLabel, offset: i64) -> NewSession {
        NewSession {
            label,
            start_time: at(offset),
            window_title: String::new(),
            bundle_id: String::new(),
        }
    }

    /// Editor for 20 minutes, then idle for 10.
    fn seeded_database() -> Database {
        let mut db = Database::open_in_memory().unwrap();
        let editor = StateLabel::app("Editor").unwrap();
        let first = db.begin_session(None, None, &open(editor.clone(), 0)).unwrap();
        let idle = db
            .begin_session(
                Some(&SessionUpdate {
                    id: first,
                    end_time: at(1200),
                    duration_seconds: 1200,
                }),
                Some(&SwitchEvent::between(&editor, &StateLabel::Idle, at(1200))),
                &open(StateLabel::Idle, 1200),
            )
            .unwrap();
        db.update_session(
            &SessionUpdate {
                id: idle,
                end_time: at(1800),
                duration_seconds: 600,
            },
            true,
        )
        .unwrap();
        db
    }

    #[test]
    fn summarizes_and_saves_window() {
        let mut db = seeded_database();
        let mut output = Vec::new();
        run(&mut output, &mut db, at(0), at(1800), false).unwrap();

        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        Window:   2025-01-15 09:00:00 to 2025-01-15 09:30:00
        Active:   20m 00s
        Idle:     10m 00s
        Switches: 1
        Focus:    66.7%
        ");
        assert_eq!(db.list_summaries().unwrap().len(), 1);
    }

    #[test]
    fn window_only_counts_sessions_started_inside() {
        let mut db = seeded_database();
        let mut output = Vec::new();
        run(&mut output, &mut db, at(600), at(1800), true).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(value["total_active_seconds"], 0);
        assert_eq!(value["total_idle_seconds"], 600);
        assert_eq!(value["app_switches"], 1);
        assert_eq!(value["focus_score"], 0.0);
    }

    #[test]
    fn rejects_inverted_window() {
        let mut db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        assert!(run(&mut output, &mut db, at(60), at(0), false).is_err());
        assert!(db.list_summaries().unwrap().is_empty());
    }
}
