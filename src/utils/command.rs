use crate::models::error::{ExporterError, Result};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Captured result of a command that exited successfully.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Run `program` with `args`, killing it if it has not finished after `timeout`.
///
/// A timeout maps to `CommandTimeout`, a non-zero exit to `CommandFailed`.
pub async fn run_with_timeout(
    program: &str,
    args: &[String],
    timeout: Duration,
) -> Result<CommandOutput> {
    let command_line = describe(program, args);

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    // dropping the output future on timeout kills the child
    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(cause)) => {
            return Err(ExporterError::CommandSpawn {
                command: command_line,
                cause,
            })
        }
        Err(_) => {
            return Err(ExporterError::CommandTimeout {
                command: command_line,
                timeout,
            })
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        return Err(ExporterError::CommandFailed {
            command: command_line,
            code: output.status.code(),
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(CommandOutput {
        code: output.status.code(),
        stdout,
        stderr,
    })
}

fn describe(program: &str, args: &[String]) -> String {
    std::iter::once(program.to_string())
        .chain(args.iter().cloned())
        .collect::<Vec<_>>()
        .join(" ")
}
