//! OS signal handling for daemon mode

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::info;

/// Requests delivered to the daemon's main loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonSignal {
    /// Re-read the config file (SIGHUP or `reload`)
    Reload,
    /// Stop recording and exit (SIGINT/SIGTERM or `shutdown`)
    Shutdown,
}

/// Daemon signal handler
///
/// Turns SIGINT/SIGTERM/SIGHUP into [`DaemonSignal`]s and hands out a
/// sender so the control socket can feed the same loop.
pub struct DaemonSignalHandler {
    receiver: mpsc::Receiver<DaemonSignal>,
}

impl DaemonSignalHandler {
    pub fn new() -> Result<(Self, mpsc::Sender<DaemonSignal>), std::io::Error> {
        let (tx, rx) = mpsc::channel(10);

        forward(SignalKind::interrupt(), "SIGINT", DaemonSignal::Shutdown, tx.clone())?;
        forward(SignalKind::terminate(), "SIGTERM", DaemonSignal::Shutdown, tx.clone())?;
        forward(SignalKind::hangup(), "SIGHUP", DaemonSignal::Reload, tx.clone())?;

        Ok((Self { receiver: rx }, tx))
    }

    /// Wait for the next signal
    pub async fn recv(&mut self) -> Option<DaemonSignal> {
        self.receiver.recv().await
    }
}

fn forward(
    kind: SignalKind,
    name: &'static str,
    event: DaemonSignal,
    tx: mpsc::Sender<DaemonSignal>,
) -> Result<(), std::io::Error> {
    let mut stream = signal(kind)?;
    tokio::spawn(async move {
        while stream.recv().await.is_some() {
            info!(signal = name, "Received signal");
            if tx.send(event).await.is_err() {
                break;
            }
        }
    });
    Ok(())
}
