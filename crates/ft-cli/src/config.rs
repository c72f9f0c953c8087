//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use ft_core::{TrackerSettings, ValidationError};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
    /// Seconds between samples.
    pub poll_interval_secs: u64,
    /// Seconds without input before the user counts as idle.
    pub idle_threshold_secs: u64,
    /// Seconds between timeline snapshots.
    pub timeline_interval_secs: u64,
    /// Log a switch with no origin when a run's first session opens.
    pub emit_initial_switch: bool,
    /// Shell command printing the frontmost application name.
    pub app_command: String,
    /// Shell command printing the frontmost window title. Empty disables it.
    pub window_title_command: String,
    /// Shell command printing the frontmost bundle or class id. Empty disables it.
    pub bundle_id_command: String,
    /// Seconds a monitor command may run before it is killed.
    pub monitor_timeout_secs: u64,
    /// Long-running shell command printing one line per input event.
    pub input_command: Option<String>,
    /// Capacity of the input pulse channel.
    pub pulse_buffer: usize,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("idle_threshold_secs", &self.idle_threshold_secs)
            .field("timeline_interval_secs", &self.timeline_interval_secs)
            .field("emit_initial_switch", &self.emit_initial_switch)
            .field("app_command", &self.app_command)
            .field("monitor_timeout_secs", &self.monitor_timeout_secs)
            .field("input_command", &self.input_command)
            .finish_non_exhaustive()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        let (app_command, window_title_command, bundle_id_command) = default_monitor_commands();
        Self {
            database_path: data_dir.join("ft.db"),
            poll_interval_secs: 5,
            idle_threshold_secs: 60,
            timeline_interval_secs: 30,
            emit_initial_switch: false,
            app_command: app_command.to_string(),
            window_title_command: window_title_command.to_string(),
            bundle_id_command: bundle_id_command.to_string(),
            monitor_timeout_secs: 2,
            input_command: None,
            pulse_buffer: 64,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (FT_*)
        figment = figment.merge(Env::prefixed("FT_"));

        figment.extract()
    }

    pub fn tracker_settings(&self) -> Result<TrackerSettings, ValidationError> {
        TrackerSettings::from_secs(
            self.idle_threshold_secs,
            self.timeline_interval_secs,
            self.emit_initial_switch,
        )
    }

    pub fn poll_interval(&self) -> Result<Duration, ValidationError> {
        if self.poll_interval_secs == 0 {
            return Err(ValidationError::NonPositive {
                field: "poll interval",
                value: 0,
            });
        }
        Ok(Duration::from_secs(self.poll_interval_secs))
    }

    pub fn monitor_timeout(&self) -> Result<Duration, ValidationError> {
        if self.monitor_timeout_secs == 0 {
            return Err(ValidationError::NonPositive {
                field: "monitor timeout",
                value: 0,
            });
        }
        Ok(Duration::from_secs(self.monitor_timeout_secs))
    }

    pub const fn pulse_buffer(&self) -> Result<usize, ValidationError> {
        if self.pulse_buffer == 0 {
            return Err(ValidationError::NonPositive {
                field: "pulse buffer",
                value: 0,
            });
        }
        Ok(self.pulse_buffer)
    }
}

#[cfg(target_os = "macos")]
const fn default_monitor_commands() -> (&'static str, &'static str, &'static str) {
    (
        r#"osascript -e 'tell application "System Events" to get name of first application process whose frontmost is true'"#,
        r#"osascript -e 'tell application "System Events" to get name of front window of (first application process whose frontmost is true)'"#,
        r#"osascript -e 'id of application (path to frontmost application as text)'"#,
    )
}

#[cfg(not(target_os = "macos"))]
const fn default_monitor_commands() -> (&'static str, &'static str, &'static str) {
    (
        "ps -o comm= -p \"$(xdotool getactivewindow getwindowpid)\"",
        "xdotool getactivewindow getwindowname",
        "xdotool getactivewindow getwindowclassname",
    )
}

/// Returns the platform-specific config directory for ft.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("ft"))
}

/// Returns the platform-specific data directory for ft.
///
/// On Linux: `~/.local/share/ft`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("ft"))
}
