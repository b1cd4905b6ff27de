//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, signal handling,
//! the daemon runner and its control socket.

pub mod app;
pub mod args;
pub mod config_cmd;
pub mod daemon_app;
pub mod daemon_cmd;
pub mod library_cmd;
pub mod pid_file;
pub mod presenter;
pub mod signals;
pub mod socket;

// Re-export commonly used types
pub use app::{init_tracing, load_snapshot, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
pub use args::{Cli, Commands, ConfigAction, DaemonAction, LibraryAction};
pub use daemon_app::run_daemon;
pub use daemon_cmd::handle_daemon_command;
pub use presenter::Presenter;
