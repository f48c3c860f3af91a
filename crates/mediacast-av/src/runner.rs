//! Bounded execution of external tools.

use crate::{Error, Result};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;

/// Run a prepared command to completion, killing it if `timeout` elapses.
///
/// `tool` names the program in errors and logs. Stdout and stderr are
/// captured; stdin is closed.
pub(crate) async fn run_with_timeout(
    mut command: Command,
    tool: &str,
    timeout: Duration,
) -> Result<Output> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = command.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::tool_not_found(tool)
        } else {
            Error::Io(e)
        }
    })?;

    // Dropping the wait future on timeout drops the child, which kills it.
    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(output) => Ok(output?),
        Err(_) => {
            tracing::warn!(tool, seconds = timeout.as_secs(), "external tool timed out");
            Err(Error::Timeout {
                tool: tool.to_string(),
                seconds: timeout.as_secs(),
            })
        }
    }
}
