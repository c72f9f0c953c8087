//! Activity monitor backed by shell commands.
//!
//! Each field is read by running a configured command through `sh -c` and
//! taking the first line of its output. This keeps platform specifics
//! (`xdotool`, `osascript`, compositor IPC) in configuration.
//!
//! Commands run on the tokio runtime behind `handle` and are killed once
//! they exceed the timeout, so a hung accessor cannot stall the poll loop.

use std::process::Stdio;
use std::time::Duration;

use ft_core::{ActivityMonitor, MonitorError, ValidationError};
use tokio::process::Command;
use tokio::runtime::Handle;

use crate::Config;

/// Default limit for a single monitor command.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct CommandMonitor {
    handle: Handle,
    timeout: Duration,
    app_command: String,
    window_title_command: String,
    bundle_id_command: String,
}

impl CommandMonitor {
    /// Creates a monitor whose commands run on `handle`.
    ///
    /// Sampling blocks the calling thread, so it must not be called from an
    /// async task directly; the poll loop wraps ticks in `block_in_place`.
    pub fn new(
        handle: Handle,
        app_command: impl Into<String>,
        window_title_command: impl Into<String>,
        bundle_id_command: impl Into<String>,
    ) -> Self {
        Self {
            handle,
            timeout: DEFAULT_COMMAND_TIMEOUT,
            app_command: app_command.into(),
            window_title_command: window_title_command.into(),
            bundle_id_command: bundle_id_command.into(),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_config(config: &Config, handle: Handle) -> Result<Self, ValidationError> {
        let monitor = Self::new(
            handle,
            config.app_command.clone(),
            config.window_title_command.clone(),
            config.bundle_id_command.clone(),
        );
        Ok(monitor.with_timeout(config.monitor_timeout()?))
    }

    /// Runs `command` and returns the first line of stdout, trimmed.
    fn first_line(&self, field: &'static str, command: &str) -> Result<String, MonitorError> {
        let mut shell = Command::new("sh");
        shell
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        let output = self
            .handle
            .block_on(async { tokio::time::timeout(self.timeout, shell.output()).await })
            .map_err(|_| MonitorError::Unavailable {
                field,
                message: format!("`{command}` timed out after {:?}", self.timeout),
            })?
            .map_err(|err| MonitorError::Unavailable {
                field,
                message: err.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MonitorError::Unavailable {
                field,
                message: format!("`{command}` exited with {}: {}", output.status, stderr.trim()),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
    }

    fn optional_field(&self, field: &'static str, command: &str) -> Result<String, MonitorError> {
        if command.trim().is_empty() {
            return Ok(String::new());
        }
        self.first_line(field, command)
    }
}

impl ActivityMonitor for CommandMonitor {
    fn app_name(&self) -> Result<String, MonitorError> {
        if self.app_command.trim().is_empty() {
            return Err(MonitorError::Unavailable {
                field: "app name",
                message: "no app command configured".to_string(),
            });
        }
        self.first_line("app name", &self.app_command)
    }

    fn window_title(&self) -> Result<String, MonitorError> {
        self.optional_field("window title", &self.window_title_command)
    }

    fn bundle_id(&self) -> Result<String, MonitorError> {
        self.optional_field("bundle id", &self.bundle_id_command)
    }
}
