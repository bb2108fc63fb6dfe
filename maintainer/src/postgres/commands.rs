// File: maintainer/src/postgres/commands.rs
use crate::config::ConnectionInfo;
use crate::errors::OperationError;
use anyhow::Result;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command as AsyncCommand;
use tokio::time::timeout;
use tracing::{debug, error, info};

/// Captured output of a finished external command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// `--host/--port/--username` arguments shared by every PostgreSQL client tool
pub fn connection_args(connection: &ConnectionInfo) -> Vec<String> {
    vec![
        format!("--host={}", connection.host),
        format!("--port={}", connection.port),
        format!("--username={}", connection.user),
    ]
}

/// Run `program` with `args`, passing the password through `PGPASSWORD`.
///
/// The child is killed if it outlives `limit`. A non-zero exit is an error
/// carrying the tool's stderr.
pub async fn run_pg_command(
    program: &str,
    args: &[String],
    password: Option<&str>,
    limit: Duration,
) -> Result<CommandOutput> {
    info!("Running: {} {}", program, args.join(" "));

    let mut command = AsyncCommand::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(password) = password {
        command.env("PGPASSWORD", password);
    }

    let child = command.spawn().map_err(|e| OperationError::SpawnFailed {
        program: program.to_string(),
        reason: e.to_string(),
    })?;

    // Dropping the future on timeout drops the child, which kills it
    let output = match timeout(limit, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(OperationError::Io {
                context: format!("Failed to collect output of {}", program),
                reason: e.to_string(),
            }
            .into())
        }
        Err(_) => {
            error!("{} exceeded {}s, killing it", program, limit.as_secs());
            return Err(OperationError::Timeout {
                program: program.to_string(),
                limit,
            }
            .into());
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if output.status.success() {
        debug!("{} output: {}", program, stdout.trim());
        Ok(CommandOutput { stdout, stderr })
    } else {
        let message = if !stderr.trim().is_empty() { stderr } else { stdout };
        error!("{} failed: {}", program, message.trim());
        Err(OperationError::CommandFailed {
            program: program.to_string(),
            exit_code: output.status.code(),
            stderr: message.trim().to_string(),
        }
        .into())
    }
}
