//! Short-lived helper processes with a hard deadline

use std::io;
use std::process::{Command, Output, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tracing::debug;

/// Run `program` to completion, capturing output.
/// Returns `Ok(None)` if it was still running after `timeout` (it is killed).
pub fn run_with_timeout(
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> io::Result<Option<Output>> {
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    let pid = child.id();

    // Reading both pipes on a side thread keeps a chatty child from blocking
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(child.wait_with_output());
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => result.map(Some),
        Err(_) => {
            debug!(program, pid, "Helper timed out, killing");
            let _ = signal::kill(Pid::from_raw(pid as i32), Signal::SIGKILL);
            Ok(None)
        }
    }
}

/// Run a shell snippet through `sh -c`
pub fn run_shell(script: &str, timeout: Duration) -> io::Result<Option<Output>> {
    run_with_timeout("sh", &["-c", script], timeout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout() {
        let output = run_shell("echo hello", Duration::from_secs(5))
            .unwrap()
            .unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
    }

    #[test]
    fn kills_slow_helpers() {
        let result = run_shell("sleep 5", Duration::from_millis(100)).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn missing_program_is_an_error() {
        let err = run_with_timeout("picorder-no-such-tool", &[], Duration::from_secs(1)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
