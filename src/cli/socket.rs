//! Unix domain socket control channel
//!
//! One request line per connection, one reply line back:
//!
//! ```text
//! start [DEVICE] | stop | status | history | auto on|off | reload | shutdown
//! ```
//!
//! Replies are `ok[: detail]`, `rejected: reason`, `error: message`,
//! a JSON status object for `status`, or a JSON array for `history`.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, warn};

use crate::domain::recording::{RecordingStatus, TransitionRecord};

const SOCKET_NAME: &str = "picorder.sock";

/// Socket path resolver
#[derive(Debug, Clone)]
pub struct SocketPath {
    path: PathBuf,
}

impl SocketPath {
    /// `$XDG_RUNTIME_DIR/picorder.sock`, falling back to the temp dir
    pub fn new() -> Self {
        let dir = std::env::var_os("XDG_RUNTIME_DIR")
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);
        Self {
            path: dir.join(SOCKET_NAME),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Remove socket file if it exists
    pub fn cleanup(&self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

impl Default for SocketPath {
    fn default() -> Self {
        Self::new()
    }
}

/// A control request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlRequest {
    Start { device: Option<String> },
    Stop,
    Status,
    History,
    Auto(bool),
    Reload,
    Shutdown,
}

impl ControlRequest {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (verb, arg) = match line.split_once(char::is_whitespace) {
            Some((verb, arg)) => (verb, arg.trim()),
            None => (line, ""),
        };

        match (verb, arg) {
            ("start", "") => Ok(Self::Start { device: None }),
            ("start", device) => Ok(Self::Start {
                device: Some(device.to_string()),
            }),
            ("stop", "") => Ok(Self::Stop),
            ("status", "") => Ok(Self::Status),
            ("history", "") => Ok(Self::History),
            ("auto", "on") => Ok(Self::Auto(true)),
            ("auto", "off") => Ok(Self::Auto(false)),
            ("reload", "") => Ok(Self::Reload),
            ("shutdown", "") => Ok(Self::Shutdown),
            _ => Err(format!("unknown command: {}", line)),
        }
    }

    pub fn to_line(&self) -> String {
        match self {
            Self::Start { device: None } => "start".to_string(),
            Self::Start {
                device: Some(device),
            } => format!("start {}", device),
            Self::Stop => "stop".to_string(),
            Self::Status => "status".to_string(),
            Self::History => "history".to_string(),
            Self::Auto(true) => "auto on".to_string(),
            Self::Auto(false) => "auto off".to_string(),
            Self::Reload => "reload".to_string(),
            Self::Shutdown => "shutdown".to_string(),
        }
    }
}

/// A control reply
#[derive(Debug, Clone, PartialEq)]
pub enum ControlReply {
    Ok(Option<String>),
    Rejected(String),
    Error(String),
    Status(Box<RecordingStatus>),
    History(Vec<TransitionRecord>),
}

impl ControlReply {
    pub fn ok() -> Self {
        Self::Ok(None)
    }

    pub fn ok_with(detail: impl Into<String>) -> Self {
        Self::Ok(Some(detail.into()))
    }

    pub fn to_line(&self) -> String {
        match self {
            Self::Ok(None) => "ok".to_string(),
            Self::Ok(Some(detail)) => format!("ok: {}", detail),
            Self::Rejected(reason) => format!("rejected: {}", reason),
            Self::Error(message) => format!("error: {}", message),
            Self::Status(status) => serde_json::to_string(status)
                .unwrap_or_else(|e| format!("error: failed to encode status: {}", e)),
            Self::History(records) => serde_json::to_string(records)
                .unwrap_or_else(|e| format!("error: failed to encode history: {}", e)),
        }
    }

    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        if line.starts_with('{') {
            return serde_json::from_str(line)
                .map(|status| Self::Status(Box::new(status)))
                .map_err(|e| format!("malformed status reply: {}", e));
        }
        if line.starts_with('[') {
            return serde_json::from_str(line)
                .map(Self::History)
                .map_err(|e| format!("malformed history reply: {}", e));
        }
        if line == "ok" {
            return Ok(Self::ok());
        }
        if let Some(detail) = line.strip_prefix("ok:") {
            return Ok(Self::ok_with(detail.trim()));
        }
        if let Some(reason) = line.strip_prefix("rejected:") {
            return Ok(Self::Rejected(reason.trim().to_string()));
        }
        if let Some(message) = line.strip_prefix("error:") {
            return Ok(Self::Error(message.trim().to_string()));
        }
        Err(format!("unexpected reply: {}", line))
    }
}

/// Handles one request on a blocking thread
pub type ControlHandler = Arc<dyn Fn(ControlRequest) -> ControlReply + Send + Sync>;

/// Daemon socket server
pub struct DaemonSocketServer {
    socket_path: SocketPath,
    listener: Option<UnixListener>,
}

impl DaemonSocketServer {
    pub fn new(socket_path: SocketPath) -> Self {
        Self {
            socket_path,
            listener: None,
        }
    }

    /// Bind to the socket, replacing a stale socket file
    pub fn bind(&mut self) -> io::Result<()> {
        self.socket_path.cleanup()?;
        self.listener = Some(UnixListener::bind(self.socket_path.path())?);
        Ok(())
    }

    pub fn path(&self) -> &Path {
        self.socket_path.path()
    }

    /// Accept connections until the task is dropped
    pub async fn run(&self, handler: ControlHandler) -> io::Result<()> {
        let listener = self
            .listener
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "Socket not bound"))?;

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let handler = Arc::clone(&handler);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, handler).await {
                            debug!(error = %e, "Control connection failed");
                        }
                    });
                }
                Err(e) => warn!(error = %e, "Control socket accept failed"),
            }
        }
    }
}

impl Drop for DaemonSocketServer {
    fn drop(&mut self) {
        if self.listener.is_some() {
            let _ = self.socket_path.cleanup();
        }
    }
}

async fn handle_connection(stream: UnixStream, handler: ControlHandler) -> io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();
    reader.read_line(&mut line).await?;

    let reply = match ControlRequest::parse(&line) {
        Ok(request) => {
            debug!(request = %request.to_line(), "Control request");
            // Handlers touch locks, the filesystem and child processes
            tokio::task::spawn_blocking(move || handler(request))
                .await
                .unwrap_or_else(|e| ControlReply::Error(format!("handler failed: {}", e)))
        }
        Err(message) => ControlReply::Error(message),
    };

    writer
        .write_all(format!("{}\n", reply.to_line()).as_bytes())
        .await?;
    writer.flush().await
}

/// Daemon socket client
pub struct DaemonSocketClient {
    socket_path: SocketPath,
}

impl DaemonSocketClient {
    pub fn new(socket_path: SocketPath) -> Self {
        Self { socket_path }
    }

    /// Check if daemon appears to be running (socket exists)
    pub fn is_daemon_running(&self) -> bool {
        self.socket_path.exists()
    }

    /// Send one request and read the reply
    pub async fn send(&self, request: &ControlRequest) -> io::Result<ControlReply> {
        let stream = UnixStream::connect(self.socket_path.path()).await?;
        let (reader, mut writer) = stream.into_split();

        writer
            .write_all(format!("{}\n", request.to_line()).as_bytes())
            .await?;
        writer.flush().await?;

        let mut reader = BufReader::new(reader);
        let mut response = String::new();
        reader.read_line(&mut response).await?;

        ControlReply::parse(&response).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recording::{RecordingMode, RecordingState};
    use chrono::{Local, TimeZone};

    #[test]
    fn socket_path_ends_with_name() {
        assert!(SocketPath::new().path().ends_with(SOCKET_NAME));
    }

    #[test]
    fn parses_requests() {
        assert_eq!(
            ControlRequest::parse("start\n"),
            Ok(ControlRequest::Start { device: None })
        );
        assert_eq!(
            ControlRequest::parse("start plughw:1,0"),
            Ok(ControlRequest::Start {
                device: Some("plughw:1,0".to_string())
            })
        );
        assert_eq!(ControlRequest::parse("auto off"), Ok(ControlRequest::Auto(false)));
        assert!(ControlRequest::parse("auto maybe").is_err());
        assert!(ControlRequest::parse("stop now").is_err());
        assert!(ControlRequest::parse("toggle").is_err());
    }

    #[test]
    fn request_lines_parse_back() {
        for request in [
            ControlRequest::Start {
                device: Some("hw:2,0".to_string()),
            },
            ControlRequest::Stop,
            ControlRequest::Auto(true),
            ControlRequest::Shutdown,
        ] {
            assert_eq!(ControlRequest::parse(&request.to_line()), Ok(request));
        }
    }

    #[test]
    fn parses_replies() {
        assert_eq!(ControlReply::parse("ok\n"), Ok(ControlReply::ok()));
        assert_eq!(
            ControlReply::parse("ok: stopped"),
            Ok(ControlReply::ok_with("stopped"))
        );
        assert_eq!(
            ControlReply::parse("rejected: already recording"),
            Ok(ControlReply::Rejected("already recording".to_string()))
        );
        assert!(ControlReply::parse("garbage").is_err());
    }

    #[test]
    fn status_reply_is_one_json_line() {
        let status = RecordingStatus {
            state: RecordingState::Recording,
            elapsed_seconds: 7,
            mode: Some(RecordingMode::Auto),
            device_id: Some("plughw:1,0".to_string()),
            ..RecordingStatus::idle(true)
        };
        let line = ControlReply::Status(Box::new(status.clone())).to_line();
        assert!(!line.contains('\n'));
        assert!(line.contains("\"state\":\"recording\""));
        assert_eq!(
            ControlReply::parse(&line),
            Ok(ControlReply::Status(Box::new(status)))
        );
    }

    #[test]
    fn history_reply_is_one_json_line() {
        let at = Local.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let records = vec![
            TransitionRecord {
                from: RecordingState::Idle,
                to: RecordingState::Starting,
                reason: "manual start".to_string(),
                at,
            },
            TransitionRecord {
                from: RecordingState::Starting,
                to: RecordingState::Recording,
                reason: "capture running".to_string(),
                at,
            },
        ];
        let line = ControlReply::History(records.clone()).to_line();
        assert!(line.starts_with('['));
        assert!(!line.contains('\n'));
        assert_eq!(ControlReply::parse(&line), Ok(ControlReply::History(records)));
        assert_eq!(ControlReply::parse("[]"), Ok(ControlReply::History(Vec::new())));
        assert_eq!(ControlRequest::parse("history"), Ok(ControlRequest::History));
    }

    #[tokio::test]
    async fn server_answers_client() {
        let dir = tempfile::tempdir().unwrap();
        let path = SocketPath::with_path(dir.path().join("test.sock"));
        let mut server = DaemonSocketServer::new(path.clone());
        server.bind().unwrap();

        let handler: ControlHandler = Arc::new(|request| match request {
            ControlRequest::Stop => ControlReply::Rejected("not recording".to_string()),
            _ => ControlReply::ok(),
        });
        let task = tokio::spawn(async move { server.run(handler).await });

        let client = DaemonSocketClient::new(path);
        assert!(client.is_daemon_running());
        assert_eq!(
            client.send(&ControlRequest::Stop).await.unwrap(),
            ControlReply::Rejected("not recording".to_string())
        );
        assert_eq!(
            client.send(&ControlRequest::Reload).await.unwrap(),
            ControlReply::ok()
        );
        task.abort();
    }
}
