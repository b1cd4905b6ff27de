//! Picorder CLI entry point

use std::process::ExitCode;
use std::sync::Arc;

use clap::{CommandFactory, Parser};

use picorder::cli::{
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    daemon_app::run_daemon,
    daemon_cmd::handle_daemon_command,
    init_tracing,
    library_cmd::{handle_devices_command, handle_library_command},
    load_snapshot,
    presenter::Presenter,
    EXIT_ERROR, EXIT_USAGE_ERROR,
};
use picorder::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let presenter = Presenter::new();
    init_tracing();

    let store = XdgConfigStore::resolve(cli.config.clone());

    let result = match cli.command {
        Some(Commands::Config { action }) => {
            handle_config_command(action, &store, &presenter).map_err(|e| e.to_string())
        }
        Some(Commands::Daemon { action }) => handle_daemon_command(action, &presenter).await,
        Some(Commands::Devices) => handle_devices_command(&load_snapshot(&store), &presenter),
        Some(Commands::Library { action }) => {
            handle_library_command(action, &load_snapshot(&store), &presenter)
        }
        None if cli.daemon => return run_daemon(Arc::new(store)).await,
        None => {
            let _ = Cli::command().print_help();
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            presenter.error(&e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
