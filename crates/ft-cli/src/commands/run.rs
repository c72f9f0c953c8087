//! Run command: tracks activity until Ctrl-C, then prints the run summary.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use ft_core::IdleDetector;
use ft_db::Database;
use tokio_util::sync::CancellationToken;

use super::summaries::write_summary;
use crate::Config;
use crate::agent::{sample_time, track};
use crate::lock::RunLock;
use crate::monitor::CommandMonitor;
use crate::pulse::{drain_pulses, pulse_channel, watch_input_command};

pub fn run<W: Write>(writer: &mut W, mut db: Database, config: &Config) -> Result<()> {
    let settings = config
        .tracker_settings()
        .context("invalid tracker settings")?;
    let poll_interval = config.poll_interval().context("invalid poll interval")?;
    let buffer = config.pulse_buffer().context("invalid pulse buffer")?;
    let _lock = RunLock::acquire(&config.database_path)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to initialize tokio runtime")?;

    let summary = runtime.block_on(async move {
        db.close_stale_sessions()
            .context("failed to recover sessions from a previous run")?;

        let cancel = CancellationToken::new();
        spawn_interrupt_handler(cancel.clone());

        let detector = Arc::new(IdleDetector::new(sample_time()));
        let (pulses, rx) = pulse_channel(buffer);
        tokio::spawn(drain_pulses(rx, Arc::clone(&detector)));

        match config.input_command.clone() {
            Some(command) => {
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    if let Err(err) = watch_input_command(&command, pulses, cancel).await {
                        tracing::error!(error = ?err, "input watcher failed");
                    }
                });
            }
            None => {
                drop(pulses);
                tracing::warn!(
                    "no input_command configured; the user will count as idle once the threshold passes"
                );
            }
        }

        let monitor = CommandMonitor::from_config(config, tokio::runtime::Handle::current())
            .context("invalid monitor timeout")?;
        let summary = track(
            &mut db,
            &monitor,
            &detector,
            settings,
            poll_interval,
            cancel.clone(),
        )
        .await;
        // Stops the input watcher.
        cancel.cancel();
        summary
    })?;

    if let Some(summary) = summary {
        writeln!(writer, "Run summary:")?;
        write_summary(writer, &summary)?;
    }
    Ok(())
}

/// Cancels `cancel` on the first Ctrl-C.
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("interrupt received, finishing run");
                cancel.cancel();
            }
            Err(err) => tracing::error!(error = %err, "failed to listen for ctrl-c"),
        }
    });
}
