//! Status command: current and last session, latest summary and recent timeline.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use ft_db::Database;

use super::summaries::write_summary;
use super::timeline::write_timeline;
use super::util::{format_duration, format_time};

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    database_path: &Path,
    limit: usize,
    json: bool,
) -> Result<()> {
    let open = db.open_session()?;
    let last = db.latest_closed_session()?;
    let latest = db.latest_summary()?;
    let timeline = db.recent_timeline(limit)?;

    if json {
        let output = serde_json::json!({
            "database": database_path,
            "open_session": open,
            "last_session": last,
            "latest_summary": latest,
            "timeline": timeline,
        });
        writeln!(writer, "{}", serde_json::to_string_pretty(&output)?)?;
        return Ok(());
    }

    writeln!(writer, "Focus tracker status")?;
    writeln!(writer, "Database: {}", database_path.display())?;
    writeln!(writer)?;

    match open {
        Some(session) => writeln!(
            writer,
            "Recording: {} since {} ({})",
            session.label,
            format_time(session.start_time),
            format_duration(session.duration_seconds)
        )?,
        None => writeln!(writer, "Not recording.")?,
    }
    if let Some(session) = last {
        writeln!(
            writer,
            "Last session: {} from {} to {} ({})",
            session.label,
            format_time(session.start_time),
            format_time(session.end_time.unwrap_or(session.start_time)),
            format_duration(session.duration_seconds)
        )?;
    }
    writeln!(writer)?;

    match latest {
        Some(summary) => {
            writeln!(writer, "Latest summary:")?;
            write_summary(writer, &summary)?;
        }
        None => writeln!(writer, "No summaries saved.")?,
    }
    writeln!(writer)?;

    writeln!(writer, "Recent timeline:")?;
    write_timeline(writer, &timeline)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone, Utc};
    use ft_core::{NewSession, SessionSummary, SessionUpdate, StateLabel, TimelineEntry};
    use insta::assert_snapshot;

    use super::*;

    #[test]
    fn status_shows_recording_summary_and_timeline() {
        let temp = tempfile::tempdir().unwrap();
        let db_path = temp.path().join("ft.db");
        let mut db = Database::open(&db_path).unwrap();
        let start = Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap();
        let editor = StateLabel::app("Editor").unwrap();

        let idle = db
            .begin_session(
                None,
                None,
                &NewSession {
                    label: StateLabel::Idle,
                    start_time: start - TimeDelta::minutes(2),
                    window_title: String::new(),
                    bundle_id: String::new(),
                },
            )
            .unwrap();
        let id = db
            .begin_session(
                Some(&SessionUpdate {
                    id: idle,
                    end_time: start,
                    duration_seconds: 120,
                }),
                None,
                &NewSession {
                    label: editor.clone(),
                    start_time: start,
                    window_title: "notes.md".to_string(),
                    bundle_id: String::new(),
                },
            )
            .unwrap();
        db.update_session(
            &SessionUpdate {
                id,
                end_time: start + TimeDelta::seconds(95),
                duration_seconds: 95,
            },
            false,
        )
        .unwrap();
        for offset in [30, 60, 90] {
            db.insert_timeline_entry(&TimelineEntry {
                timestamp: start + TimeDelta::seconds(offset),
                label: editor.clone(),
                is_idle: false,
                window_title: "notes.md".to_string(),
                bundle_id: String::new(),
            })
            .unwrap();
        }
        db.save_summary(&SessionSummary {
            id: None,
            start_time: start - TimeDelta::hours(1),
            end_time: start - TimeDelta::minutes(30),
            total_active_seconds: 1500,
            total_idle_seconds: 300,
            app_switches: 4,
            focus_score: ft_core::focus_score(1500, 300),
        })
        .unwrap();

        let mut output = Vec::new();
        run(&mut output, &db, &db_path, 2, false).unwrap();

        let output = String::from_utf8(output).unwrap();
        let output = output.replace(&db_path.display().to_string(), "[TEMP]/ft.db");
        assert_snapshot!(output, @r"
        Focus tracker status
        Database: [TEMP]/ft.db

        Recording: Editor since 2025-01-15 10:00:00 (1m 35s)
        Last session: IDLE from 2025-01-15 09:58:00 to 2025-01-15 10:00:00 (2m 00s)

        Latest summary:
        Window:   2025-01-15 09:00:00 to 2025-01-15 09:30:00
        Active:   25m 00s
        Idle:     5m 00s
        Switches: 4
        Focus:    83.3%

        Recent timeline:
        Time                 State             Window
        ───────────────────  ────────────────  ──────────────────
        2025-01-15 10:01:30  Editor            notes.md
        2025-01-15 10:01:00  Editor            notes.md
        ");
    }

    #[test]
    fn status_on_empty_database() {
        let db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        run(&mut output, &db, Path::new("/data/ft.db"), 10, false).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        Focus tracker status
        Database: /data/ft.db

        Not recording.

        No summaries saved.

        Recent timeline:
        No timeline entries recorded.
        ");
    }

    #[test]
    fn status_json_has_all_sections() {
        let db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        run(&mut output, &db, Path::new("/data/ft.db"), 10, true).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(value["database"], "/data/ft.db");
        assert!(value["open_session"].is_null());
        assert!(value["last_session"].is_null());
        assert!(value["latest_summary"].is_null());
        assert_eq!(value["timeline"], serde_json::json!([]));
    }
}
