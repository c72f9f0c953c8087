//! Storage layer for the focus tracker.
//!
//! Provides persistence for activity sessions, switch events, timeline
//! entries and run summaries using `rusqlite`, and implements the
//! [`ActivityStore`] contract the tracker writes through.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! The poll loop owns its `Database`; read-only commands open their own.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in RFC 3339 format with whole seconds
//! (e.g., `2025-01-15T10:30:00Z`). This ensures:
//! - Lexicographic ordering matches chronological ordering
//! - Human-readable values in the database
//! - Timezone-aware (always UTC)
//!
//! ## Labels
//!
//! Session, switch and timeline labels are stored as text: `IDLE` for idle
//! time, the application name otherwise.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use thiserror::Error;

use ft_core::{
    ActivityStore, NewSession, SessionId, SessionRecord, SessionSummary, SessionUpdate,
    StateLabel, StoreError, SwitchEvent, TimelineEntry, ValidationError,
};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp in {table} row {row_id}: {timestamp}")]
    TimestampParse {
        table: &'static str,
        row_id: i64,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored label is not a valid state label.
    #[error("invalid label in {table} row {row_id}")]
    InvalidLabel {
        table: &'static str,
        row_id: i64,
        #[source]
        source: ValidationError,
    },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- One row per maximal run of an identical label.
            -- end_time is NULL until the first refresh after opening.
            CREATE TABLE IF NOT EXISTS activity_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                label TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT,
                duration_seconds INTEGER NOT NULL DEFAULT 0,
                window_title TEXT NOT NULL DEFAULT '',
                bundle_id TEXT NOT NULL DEFAULT '',
                is_open INTEGER NOT NULL DEFAULT 1
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_start ON activity_sessions(start_time);
            CREATE INDEX IF NOT EXISTS idx_sessions_open ON activity_sessions(is_open);

            -- from_label is NULL only for a synthetic first switch.
            CREATE TABLE IF NOT EXISTS app_switches (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                from_label TEXT,
                to_label TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_switches_timestamp ON app_switches(timestamp);

            CREATE TABLE IF NOT EXISTS timeline (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                label TEXT NOT NULL,
                is_idle INTEGER NOT NULL,
                window_title TEXT NOT NULL DEFAULT '',
                bundle_id TEXT NOT NULL DEFAULT ''
            );

            CREATE INDEX IF NOT EXISTS idx_timeline_timestamp ON timeline(timestamp);

            CREATE TABLE IF NOT EXISTS session_summaries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                total_active_seconds INTEGER NOT NULL,
                total_idle_seconds INTEGER NOT NULL,
                app_switches INTEGER NOT NULL,
                focus_score REAL NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_summaries_end ON session_summaries(end_time);
            ",
        )?;
        Ok(())
    }

    /// Opens a session in one transaction, optionally closing the previous
    /// session and logging a switch.
    pub fn begin_session(
        &mut self,
        close: Option<&SessionUpdate>,
        switch: Option<&SwitchEvent>,
        open: &NewSession,
    ) -> Result<SessionId, DbError> {
        let tx = self.conn.transaction()?;
        if let Some(update) = close {
            tx.execute(
                "
                UPDATE activity_sessions
                SET end_time = ?, duration_seconds = ?, is_open = 0
                WHERE id = ?
                ",
                params![
                    format_timestamp(update.end_time),
                    update.duration_seconds,
                    update.id.get()
                ],
            )?;
        }
        if let Some(switch) = switch {
            tx.execute(
                "INSERT INTO app_switches (from_label, to_label, timestamp) VALUES (?, ?, ?)",
                params![
                    switch.from.as_ref().map(StateLabel::as_str),
                    switch.to.as_str(),
                    format_timestamp(switch.timestamp)
                ],
            )?;
        }
        tx.execute(
            "
            INSERT INTO activity_sessions
            (label, start_time, end_time, duration_seconds, window_title, bundle_id, is_open)
            VALUES (?, ?, NULL, 0, ?, ?, 1)
            ",
            params![
                open.label.as_str(),
                format_timestamp(open.start_time),
                open.window_title,
                open.bundle_id
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(SessionId::new(id))
    }

    /// Writes a new end time and duration; `close` also marks the session closed.
    pub fn update_session(&mut self, update: &SessionUpdate, close: bool) -> Result<(), DbError> {
        self.conn.execute(
            "
            UPDATE activity_sessions
            SET end_time = ?, duration_seconds = ?, is_open = CASE WHEN ? THEN 0 ELSE is_open END
            WHERE id = ?
            ",
            params![
                format_timestamp(update.end_time),
                update.duration_seconds,
                close,
                update.id.get()
            ],
        )?;
        Ok(())
    }

    /// Closes sessions left open by a run that never finalized.
    ///
    /// Each keeps the end time and duration of its last refresh. Returns the
    /// number of sessions closed.
    pub fn close_stale_sessions(&mut self) -> Result<usize, DbError> {
        let closed = self.conn.execute(
            "
            UPDATE activity_sessions
            SET is_open = 0, end_time = COALESCE(end_time, start_time)
            WHERE is_open = 1
            ",
            [],
        )?;
        if closed > 0 {
            tracing::warn!(closed, "closed sessions left open by a previous run");
        }
        Ok(closed)
    }

    pub fn insert_timeline_entry(&mut self, entry: &TimelineEntry) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO timeline (timestamp, label, is_idle, window_title, bundle_id)
            VALUES (?, ?, ?, ?, ?)
            ",
            params![
                format_timestamp(entry.timestamp),
                entry.label.as_str(),
                entry.is_idle,
                entry.window_title,
                entry.bundle_id
            ],
        )?;
        Ok(())
    }

    pub fn save_summary(&mut self, summary: &SessionSummary) -> Result<i64, DbError> {
        self.conn.execute(
            "
            INSERT INTO session_summaries
            (start_time, end_time, total_active_seconds, total_idle_seconds, app_switches, focus_score)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
            params![
                format_timestamp(summary.start_time),
                format_timestamp(summary.end_time),
                summary.total_active_seconds,
                summary.total_idle_seconds,
                summary.app_switches,
                summary.focus_score
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Lists all sessions, newest first.
    pub fn list_sessions(&self) -> Result<Vec<SessionRecord>, DbError> {
        self.query_sessions(
            "
            SELECT id, label, start_time, end_time, duration_seconds, window_title, bundle_id, is_open
            FROM activity_sessions
            ORDER BY start_time DESC, id DESC
            ",
            [],
        )
    }

    /// Lists sessions whose start time lies in `[start, end]`, oldest first.
    pub fn list_sessions_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SessionRecord>, DbError> {
        self.query_sessions(
            "
            SELECT id, label, start_time, end_time, duration_seconds, window_title, bundle_id, is_open
            FROM activity_sessions
            WHERE start_time >= ? AND start_time <= ?
            ORDER BY start_time ASC, id ASC
            ",
            [format_timestamp(start), format_timestamp(end)],
        )
    }

    /// Returns the most recently closed session.
    pub fn latest_closed_session(&self) -> Result<Option<SessionRecord>, DbError> {
        let sessions = self.query_sessions(
            "
            SELECT id, label, start_time, end_time, duration_seconds, window_title, bundle_id, is_open
            FROM activity_sessions
            WHERE is_open = 0
            ORDER BY end_time DESC, id DESC
            LIMIT 1
            ",
            [],
        )?;
        Ok(sessions.into_iter().next())
    }

    fn query_sessions<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Vec<SessionRecord>, DbError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, SessionRow::from_row)?;
        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?.into_record()?);
        }
        Ok(sessions)
    }

    /// Lists all switch events, newest first.
    pub fn list_switches(&self) -> Result<Vec<SwitchEvent>, DbError> {
        self.query_switches(
            "
            SELECT id, from_label, to_label, timestamp
            FROM app_switches
            ORDER BY timestamp DESC, id DESC
            ",
            [],
        )
    }

    /// Lists switch events with a timestamp in `[start, end]`, oldest first.
    pub fn list_switches_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SwitchEvent>, DbError> {
        self.query_switches(
            "
            SELECT id, from_label, to_label, timestamp
            FROM app_switches
            WHERE timestamp >= ? AND timestamp <= ?
            ORDER BY timestamp ASC, id ASC
            ",
            [format_timestamp(start), format_timestamp(end)],
        )
    }

    fn query_switches<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Vec<SwitchEvent>, DbError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;
        let mut switches = Vec::new();
        for row in rows {
            let (id, from, to, timestamp) = row?;
            switches.push(SwitchEvent {
                from: from
                    .map(|label| parse_label(label, "app_switches", id))
                    .transpose()?,
                to: parse_label(to, "app_switches", id)?,
                timestamp: parse_timestamp(&timestamp, "app_switches", id)?,
            });
        }
        Ok(switches)
    }

    /// Returns the most recent `limit` timeline entries, newest first.
    pub fn recent_timeline(&self, limit: usize) -> Result<Vec<TimelineEntry>, DbError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.query_timeline(
            "
            SELECT id, timestamp, label, is_idle, window_title, bundle_id
            FROM timeline
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            ",
            [limit],
        )
    }

    /// Lists all timeline entries, newest first.
    pub fn list_timeline(&self) -> Result<Vec<TimelineEntry>, DbError> {
        self.query_timeline(
            "
            SELECT id, timestamp, label, is_idle, window_title, bundle_id
            FROM timeline
            ORDER BY timestamp DESC, id DESC
            ",
            [],
        )
    }

    fn query_timeline<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Vec<TimelineEntry>, DbError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, bool>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;
        let mut entries = Vec::new();
        for row in rows {
            let (id, timestamp, label, is_idle, window_title, bundle_id) = row?;
            entries.push(TimelineEntry {
                timestamp: parse_timestamp(&timestamp, "timeline", id)?,
                label: parse_label(label, "timeline", id)?,
                is_idle,
                window_title,
                bundle_id,
            });
        }
        Ok(entries)
    }

    /// Lists all run summaries, newest first.
    pub fn list_summaries(&self) -> Result<Vec<SessionSummary>, DbError> {
        self.query_summaries(
            "
            SELECT id, start_time, end_time, total_active_seconds, total_idle_seconds, app_switches, focus_score
            FROM session_summaries
            ORDER BY start_time DESC, id DESC
            ",
        )
    }

    /// Returns the summary with the latest end time.
    pub fn latest_summary(&self) -> Result<Option<SessionSummary>, DbError> {
        let summaries = self.query_summaries(
            "
            SELECT id, start_time, end_time, total_active_seconds, total_idle_seconds, app_switches, focus_score
            FROM session_summaries
            ORDER BY end_time DESC, id DESC
            LIMIT 1
            ",
        )?;
        Ok(summaries.into_iter().next())
    }

    fn query_summaries(&self, sql: &str) -> Result<Vec<SessionSummary>, DbError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, f64>(6)?,
            ))
        })?;
        let mut summaries = Vec::new();
        for row in rows {
            let (id, start, end, active, idle, switches, focus_score) = row?;
            summaries.push(SessionSummary {
                id: Some(id),
                start_time: parse_timestamp(&start, "session_summaries", id)?,
                end_time: parse_timestamp(&end, "session_summaries", id)?,
                total_active_seconds: active,
                total_idle_seconds: idle,
                app_switches: switches,
                focus_score,
            });
        }
        Ok(summaries)
    }

    /// Counts open sessions. At most one exists while a run is active.
    pub fn open_session_count(&self) -> Result<i64, DbError> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM activity_sessions WHERE is_open = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Returns the currently open session, if a run is in progress.
    pub fn open_session(&self) -> Result<Option<SessionRecord>, DbError> {
        let row = self
            .conn
            .query_row(
                "
                SELECT id, label, start_time, end_time, duration_seconds, window_title, bundle_id, is_open
                FROM activity_sessions
                WHERE is_open = 1
                ORDER BY start_time DESC, id DESC
                LIMIT 1
                ",
                [],
                SessionRow::from_row,
            )
            .optional()?;
        row.map(SessionRow::into_record).transpose()
    }
}

impl ActivityStore for Database {
    fn start_session(
        &mut self,
        close: Option<&SessionUpdate>,
        switch: Option<&SwitchEvent>,
        open: &NewSession,
    ) -> Result<SessionId, StoreError> {
        self.begin_session(close, switch, open)
            .map_err(|err| StoreError::new("start session", err))
    }

    fn refresh_session(&mut self, update: &SessionUpdate) -> Result<(), StoreError> {
        self.update_session(update, false)
            .map_err(|err| StoreError::new("refresh session", err))
    }

    fn close_session(&mut self, update: &SessionUpdate) -> Result<(), StoreError> {
        self.update_session(update, true)
            .map_err(|err| StoreError::new("close session", err))
    }

    fn append_timeline(&mut self, entry: &TimelineEntry) -> Result<(), StoreError> {
        self.insert_timeline_entry(entry)
            .map_err(|err| StoreError::new("append timeline entry", err))
    }

    fn sessions_started_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SessionRecord>, StoreError> {
        self.list_sessions_between(start, end)
            .map_err(|err| StoreError::new("read sessions", err))
    }

    fn switches_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SwitchEvent>, StoreError> {
        self.list_switches_between(start, end)
            .map_err(|err| StoreError::new("read switch events", err))
    }

    fn insert_summary(&mut self, summary: &SessionSummary) -> Result<i64, StoreError> {
        self.save_summary(summary)
            .map_err(|err| StoreError::new("insert summary", err))
    }
}

/// Raw `activity_sessions` row before timestamp and label parsing.
struct SessionRow {
    id: i64,
    label: String,
    start_time: String,
    end_time: Option<String>,
    duration_seconds: i64,
    window_title: String,
    bundle_id: String,
    is_open: bool,
}

impl SessionRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            label: row.get(1)?,
            start_time: row.get(2)?,
            end_time: row.get(3)?,
            duration_seconds: row.get(4)?,
            window_title: row.get(5)?,
            bundle_id: row.get(6)?,
            is_open: row.get(7)?,
        })
    }

    fn into_record(self) -> Result<SessionRecord, DbError> {
        const TABLE: &str = "activity_sessions";
        Ok(SessionRecord {
            id: SessionId::new(self.id),
            label: parse_label(self.label, TABLE, self.id)?,
            start_time: parse_timestamp(&self.start_time, TABLE, self.id)?,
            end_time: self
                .end_time
                .map(|end| parse_timestamp(&end, TABLE, self.id))
                .transpose()?,
            duration_seconds: self.duration_seconds,
            window_title: self.window_title,
            bundle_id: self.bundle_id,
            is_open: self.is_open,
        })
    }
}

fn parse_label(label: String, table: &'static str, row_id: i64) -> Result<StateLabel, DbError> {
    StateLabel::try_from(label).map_err(|source| DbError::InvalidLabel {
        table,
        row_id,
        source,
    })
}

fn parse_timestamp(
    timestamp: &str,
    table: &'static str,
    row_id: i64,
) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            table,
            row_id,
            timestamp: timestamp.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}
