// kdebug-core/src/exec.rs
use std::process::Stdio;

use kdebug_common::error::{KdebugError, Result};
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs an external command to completion, capturing its output. The
/// caller suspends until the child terminates; a non-zero exit is
/// classified into `KdebugError::Process` before it crosses this boundary.
pub async fn run(program: &str, args: &[String], envs: &[(String, String)]) -> Result<CommandOutput> {
    debug!("Running command: {} {:?}", program, args);

    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.envs(envs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    cmd.kill_on_drop(true);
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.stdin(Stdio::null());

    let output = cmd.output().await?;
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if output.status.success() {
        debug!("Command finished successfully.");
        Ok(CommandOutput { stdout, stderr })
    } else {
        debug!("Command failed with status: {}", output.status);
        if !stdout.trim().is_empty() {
            debug!("Stdout:\n{}", stdout.trim());
        }
        if !stderr.trim().is_empty() {
            debug!("Stderr:\n{}", stderr.trim());
        }
        Err(KdebugError::Process {
            code: output.status.code().unwrap_or(-1),
            stdout,
            stderr,
        })
    }
}
