//! Input activity pulses.
//!
//! Producers stamp an [`ActivityPulse`] and push it into a bounded channel.
//! A single consumer task applies pulses to the shared [`IdleDetector`].
//! Pulses carry no payload, so a full buffer simply drops the newest one.

use std::process::Stdio;
use std::sync::Arc;

use anyhow::{Context, Result};
use ft_core::{ActivityPulse, IdleDetector};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};
use tokio_util::sync::CancellationToken;

/// Sending half of the pulse channel.
#[derive(Debug, Clone)]
pub struct PulseSender {
    tx: Sender<ActivityPulse>,
}

impl PulseSender {
    /// Queues a pulse without waiting. Returns `false` if it was dropped.
    pub fn send(&self, pulse: ActivityPulse) -> bool {
        match self.tx.try_send(pulse) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::trace!("pulse buffer full, dropping pulse");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

/// Creates a pulse channel holding at most `buffer` pending pulses.
///
/// `buffer` must be non-zero.
pub fn pulse_channel(buffer: usize) -> (PulseSender, Receiver<ActivityPulse>) {
    let (tx, rx) = mpsc::channel(buffer);
    (PulseSender { tx }, rx)
}

/// Applies pulses to `detector` until every sender is dropped.
pub async fn drain_pulses(mut rx: Receiver<ActivityPulse>, detector: Arc<IdleDetector>) {
    while let Some(pulse) = rx.recv().await {
        detector.apply(pulse);
    }
    tracing::debug!("pulse channel closed");
}

/// Spawns `command` and emits one pulse per line it prints.
///
/// Lines are read as raw bytes; their content is ignored. Returns when the command exits or `cancel` fires; the child is killed
/// on cancellation.
pub async fn watch_input_command(
    command: &str,
    pulses: PulseSender,
    cancel: CancellationToken,
) -> Result<()> {
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("failed to spawn input command `{command}`"))?;
    let stdout = child
        .stdout
        .take()
        .context("input command has no stdout")?;
    let mut lines = BufReader::new(stdout).split(b'\n');

    tracing::info!(command, "watching input events");
    loop {
        tokio::select! {
            line = lines.next_segment() => {
                let line = line.context("failed to read input command output")?;
                if line.is_none() {
                    tracing::warn!(command, "input command exited");
                    break;
                }
                pulses.send(ActivityPulse::now());
            }
            () = cancel.cancelled() => break,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone, Utc};

    use super::*;

    #[test]
    fn full_buffer_drops_pulses() {
        let (sender, mut rx) = pulse_channel(2);
        let pulse = ActivityPulse::now();

        assert!(sender.send(pulse));
        assert!(sender.send(pulse));
        assert!(!sender.send(pulse));

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_channel_rejects_pulses() {
        let (sender, rx) = pulse_channel(1);
        drop(rx);
        assert!(!sender.send(ActivityPulse::now()));
    }

    #[tokio::test]
    async fn drained_pulses_reset_idle_state() {
        let start = Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap();
        let detector = Arc::new(IdleDetector::new(start));
        let (sender, rx) = pulse_channel(4);

        sender.send(ActivityPulse {
            at: start + TimeDelta::seconds(90),
        });
        drop(sender);
        drain_pulses(rx, Arc::clone(&detector)).await;

        let threshold = TimeDelta::seconds(60);
        assert!(!detector.is_idle_at(threshold, start + TimeDelta::seconds(120)));
        assert!(detector.is_idle_at(threshold, start + TimeDelta::seconds(151)));
    }

    #[tokio::test]
    async fn input_command_lines_become_pulses() {
        let (sender, mut rx) = pulse_channel(8);
        watch_input_command("printf 'key\\nmouse\\nkey\\n'", sender, CancellationToken::new())
            .await
            .unwrap();

        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, 3);
    }

    #[tokio::test]
    async fn non_utf8_lines_still_count() {
        let (sender, mut rx) = pulse_channel(8);
        watch_input_command(
            "printf 'key\\n\\377\\nkey\\nkey\\n'",
            sender,
            CancellationToken::new(),
        )
        .await
        .unwrap();

        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, 4);
    }

    #[tokio::test]
    async fn cancellation_stops_watching() {
        let (sender, _rx) = pulse_channel(1);
        let cancel = CancellationToken::new();
        cancel.cancel();
        watch_input_command("sleep 30", sender, cancel).await.unwrap();
    }
}
