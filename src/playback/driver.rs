//! Frame source for hosts without their own update loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::player::{PlaybackPhase, Player};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriveSummary {
    pub ticks: u64,
    pub dispatched: usize,
    pub anomalies: usize,
    /// Playback ran to the end of the session rather than being stopped
    pub completed: bool,
}

enum TickerCommand {
    Shutdown,
}

/// Handle to a spawned ticker task
pub struct TickerHandle {
    cmd_tx: mpsc::UnboundedSender<TickerCommand>,
    task: JoinHandle<DriveSummary>,
}

impl TickerHandle {
    /// Stop ticking. Playback state is left as is.
    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(TickerCommand::Shutdown);
    }

    /// Wait for the ticker to finish
    pub async fn join(self) -> Option<DriveSummary> {
        match self.task.await {
            Ok(summary) => Some(summary),
            Err(e) => {
                tracing::error!(error = %e, "ticker task failed");
                None
            }
        }
    }
}

/// Tick `player` every `period` until it returns to `Stopped`
pub async fn drive(player: Arc<Player>, period: Duration) -> DriveSummary {
    let (_cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    run(player, period, cmd_rx).await
}

/// Spawn [`drive`] on the current runtime
pub fn spawn_ticker(player: Arc<Player>, period: Duration) -> TickerHandle {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(player, period, cmd_rx));
    TickerHandle { cmd_tx, task }
}

async fn run(
    player: Arc<Player>,
    period: Duration,
    mut cmd_rx: mpsc::UnboundedReceiver<TickerCommand>,
) -> DriveSummary {
    let mut interval = tokio::time::interval(period.max(Duration::from_millis(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut summary = DriveSummary::default();

    loop {
        tokio::select! {
            Some(cmd) = cmd_rx.recv() => match cmd {
                TickerCommand::Shutdown => break,
            },
            _ = interval.tick() => {
                let report = player.tick();
                summary.ticks += 1;
                summary.dispatched += report.dispatched;
                summary.anomalies += report.anomalies.len();
                if report.finished {
                    summary.completed = true;
                    break;
                }
                if player.phase() == PlaybackPhase::Stopped {
                    break;
                }
            }
        }
    }

    tracing::debug!(?summary, "ticker finished");
    summary
}
