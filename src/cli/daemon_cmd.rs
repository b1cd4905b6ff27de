//! Daemon command handler - sends commands to running daemon via the control socket

use super::args::DaemonAction;
use super::presenter::Presenter;
use super::socket::{ControlReply, ControlRequest, DaemonSocketClient, SocketPath};

impl From<DaemonAction> for ControlRequest {
    fn from(action: DaemonAction) -> Self {
        match action {
            DaemonAction::Start { device } => ControlRequest::Start { device },
            DaemonAction::Stop => ControlRequest::Stop,
            DaemonAction::Status => ControlRequest::Status,
            DaemonAction::History => ControlRequest::History,
            DaemonAction::Auto { state } => ControlRequest::Auto(state.enabled()),
            DaemonAction::Reload => ControlRequest::Reload,
            DaemonAction::Shutdown => ControlRequest::Shutdown,
        }
    }
}

/// Handle daemon subcommand
pub async fn handle_daemon_command(
    action: DaemonAction,
    presenter: &Presenter,
) -> Result<(), String> {
    let client = DaemonSocketClient::new(SocketPath::new());

    if !client.is_daemon_running() {
        return Err("No daemon running. Start with: picorder --daemon".to_string());
    }

    let request = ControlRequest::from(action);
    let reply = client
        .send(&request)
        .await
        .map_err(|e| format!("Failed to communicate with daemon: {}", e))?;

    match reply {
        ControlReply::Status(status) => {
            presenter.daemon_status(&status);
            Ok(())
        }
        ControlReply::History(records) => {
            presenter.history(&records);
            Ok(())
        }
        ControlReply::Ok(detail) => {
            presenter.success(detail.as_deref().unwrap_or(&request.to_line()));
            Ok(())
        }
        ControlReply::Rejected(reason) => Err(format!("Rejected: {}", reason)),
        ControlReply::Error(message) => Err(message),
    }
}
