// kdebug-core/src/tunnel.rs
//! Local tunnel to the remote debug endpoint, backed by a long-running
//! `kubectl port-forward` child. The ephemeral local port is scraped from
//! the child's stdout as chunks arrive; the child keeps running after the
//! port is known, it *is* the tunnel.

use std::process::Stdio;
use std::sync::OnceLock;

use kdebug_common::config::Config;
use kdebug_common::error::{KdebugError, Result};
use regex::Regex;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStdout, Command};
use tokio::time;
use tracing::debug;

use crate::handshake::{ForwardSpec, SessionHandle};

fn port_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // "Forwarding from 127.0.0.1:54321 -> 1236"
    RE.get_or_init(|| Regex::new(r"from\s+.+:(\d+)\s+->").unwrap())
}

/// Incremental matcher over the forwarding process's output. The match
/// may span reads, so every chunk is appended to an accumulating buffer
/// and the whole buffer is re-scanned.
#[derive(Debug, Default)]
pub struct PortScanner {
    buf: String,
}

impl PortScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &str) -> Option<u16> {
        self.buf.push_str(chunk);
        port_pattern()
            .captures(&self.buf)
            .and_then(|c| c[1].parse().ok())
    }

    fn into_buffer(self) -> String {
        self.buf
    }
}

/// An established tunnel. Owns the forwarding process: dropping the
/// tunnel (or calling [`Tunnel::shutdown`]) terminates it.
#[derive(Debug)]
pub struct Tunnel {
    local_port: u16,
    child: Child,
}

impl Tunnel {
    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    pub async fn shutdown(mut self) -> Result<()> {
        debug!("Shutting down port forward on 127.0.0.1:{}", self.local_port);
        self.child.kill().await?;
        Ok(())
    }
}

/// Spawns the forwarding process and resolves once its stdout reports the
/// local port. Bounded by `config.tunnel_timeout`.
pub async fn open(config: &Config, handle: &SessionHandle) -> Result<Tunnel> {
    let (program, args) = forward_command(config, handle)?;
    debug!("Starting port forward: {} {:?}", program, args);

    let mut cmd = Command::new(&program);
    cmd.args(&args);
    cmd.envs(config.cluster_env());
    cmd.kill_on_drop(true);
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.stdin(Stdio::null());

    let mut child = cmd.spawn()?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| KdebugError::Config("port forward stdout was not captured".to_string()))?;

    match time::timeout(config.tunnel_timeout, wait_for_port(stdout, &mut child)).await {
        Ok(Ok((local_port, rest))) => {
            debug!("Port forward established on 127.0.0.1:{local_port}");
            drain_in_background(rest);
            if let Some(stderr) = child.stderr.take() {
                drain_in_background(stderr);
            }
            Ok(Tunnel { local_port, child })
        }
        Ok(Err(e)) => Err(e),
        Err(_) => {
            let _ = child.start_kill();
            Err(KdebugError::TunnelTimeout(config.tunnel_timeout))
        }
    }
}

/// Scans stdout until the port line appears. EOF without a match means
/// the process is gone: a non-zero exit surfaces as `Process`, a clean
/// exit as `NoPortFound`.
async fn wait_for_port(mut stdout: ChildStdout, child: &mut Child) -> Result<(u16, ChildStdout)> {
    let mut scanner = PortScanner::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stdout.read(&mut chunk).await?;
        if n == 0 {
            let status = child.wait().await?;
            let stderr = read_stderr(child).await;
            return Err(match status.code() {
                Some(0) => KdebugError::NoPortFound,
                code => KdebugError::Process {
                    code: code.unwrap_or(-1),
                    stdout: scanner.into_buffer(),
                    stderr,
                },
            });
        }
        if let Some(port) = scanner.push(&String::from_utf8_lossy(&chunk[..n])) {
            return Ok((port, stdout));
        }
    }
}

async fn read_stderr(child: &mut Child) -> String {
    let mut stderr = String::new();
    if let Some(mut pipe) = child.stderr.take() {
        let _ = pipe.read_to_string(&mut stderr).await;
    }
    stderr
}

// Anything the forwarding process prints after resolution is diagnostic
// noise; keep the pipes drained so the child never blocks on a full buffer.
fn drain_in_background(mut pipe: impl tokio::io::AsyncRead + Unpin + Send + 'static) {
    tokio::spawn(async move {
        let mut chunk = [0u8; 1024];
        loop {
            match pipe.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    let text = String::from_utf8_lossy(&chunk[..n]);
                    if !text.trim().is_empty() {
                        debug!("port forward: {}", text.trim());
                    }
                }
            }
        }
    });
}

fn forward_command(config: &Config, handle: &SessionHandle) -> Result<(String, Vec<String>)> {
    match &handle.forward {
        ForwardSpec::Command(cmd) => {
            let mut tokens = cmd.split_whitespace().map(str::to_string);
            let program = tokens.next().ok_or_else(|| {
                KdebugError::Handshake("empty port-forward command".to_string())
            })?;
            // Honor a configured kubectl override for helper-reported
            // commands, which always name the bare tool.
            let program = if program == "kubectl" {
                config.kubectl_path.clone()
            } else {
                program
            };
            Ok((program, tokens.collect()))
        }
        ForwardSpec::Target { pod, remote_port } => {
            let mut args: Vec<String> = Vec::new();
            if let Some(kubeconfig) = &config.kubeconfig {
                args.push(format!("--kubeconfig={}", kubeconfig.display()));
            }
            if let Some(ns) = &handle.remote_namespace {
                args.push(format!("--namespace={ns}"));
            }
            args.push("port-forward".to_string());
            args.push(pod.clone());
            args.push(format!(":{remote_port}"));
            Ok((config.kubectl_path.clone(), args))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scanner_matches_across_chunk_boundaries() {
        let mut scanner = PortScanner::new();
        assert_eq!(scanner.push("Forward"), None);
        assert_eq!(scanner.push("ing from 127.0.0.1:543"), None);
        assert_eq!(scanner.push("21 -> 1236\n"), Some(54321));
    }

    #[test]
    fn scanner_matches_single_line() {
        let mut scanner = PortScanner::new();
        assert_eq!(
            scanner.push("Forwarding from 127.0.0.1:8080 -> 1235\n"),
            Some(8080)
        );
    }

    #[test]
    fn scanner_ignores_unrelated_output() {
        let mut scanner = PortScanner::new();
        assert_eq!(scanner.push("error: something\n"), None);
        assert_eq!(scanner.push("still nothing\n"), None);
    }

    #[test]
    fn target_forward_command_shape() {
        let config = Config {
            kubectl_path: "/usr/local/bin/kubectl".to_string(),
            ..Config::default()
        };
        let handle = SessionHandle {
            remote_pod: Some("debug-abc".to_string()),
            remote_namespace: Some("debug-system".to_string()),
            forward: ForwardSpec::Target {
                pod: "debug-abc".to_string(),
                remote_port: 1235,
            },
        };
        let (program, args) = forward_command(&config, &handle).unwrap();
        assert_eq!(program, "/usr/local/bin/kubectl");
        assert_eq!(
            args,
            vec!["--namespace=debug-system", "port-forward", "debug-abc", ":1235"]
        );
    }

    #[test]
    fn command_forward_honors_kubectl_override() {
        let config = Config {
            kubectl_path: "/opt/bin/kubectl".to_string(),
            ..Config::default()
        };
        let handle = SessionHandle {
            remote_pod: None,
            remote_namespace: None,
            forward: ForwardSpec::Command("kubectl port-forward x :1234 -n ns".to_string()),
        };
        let (program, args) = forward_command(&config, &handle).unwrap();
        assert_eq!(program, "/opt/bin/kubectl");
        assert_eq!(args, vec!["port-forward", "x", ":1234", "-n", "ns"]);
    }
}

#[cfg(all(test, unix))]
mod process_tests {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::time::Duration;

    use tempfile::TempDir;

    use super::*;

    fn script_handle(dir: &TempDir, name: &str, body: &str) -> SessionHandle {
        let path = dir.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        SessionHandle {
            remote_pod: None,
            remote_namespace: None,
            forward: ForwardSpec::Command(path.display().to_string()),
        }
    }

    #[tokio::test]
    async fn resolves_port_and_keeps_child_alive() {
        let dir = TempDir::new().unwrap();
        let handle = script_handle(
            &dir,
            "forward_ok",
            "echo 'Forwarding from 127.0.0.1:54321 -> 1236'\nexec sleep 30",
        );
        let config = Config::default();

        let tunnel = open(&config, &handle).await.unwrap();
        assert_eq!(tunnel.local_port(), 54321);
        tunnel.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn nonzero_exit_before_match_is_a_process_error() {
        let dir = TempDir::new().unwrap();
        let handle = script_handle(
            &dir,
            "forward_fail",
            "echo 'error: unable to forward' >&2\nexit 1",
        );
        let config = Config::default();

        let err = open(&config, &handle).await.unwrap_err();
        match err {
            KdebugError::Process { code, stderr, .. } => {
                assert_eq!(code, 1);
                assert!(stderr.contains("unable to forward"));
            }
            other => panic!("expected Process error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn clean_exit_without_match_is_no_port_found() {
        let dir = TempDir::new().unwrap();
        let handle = script_handle(&dir, "forward_silent", "echo 'nothing useful'\nexit 0");
        let config = Config::default();

        let err = open(&config, &handle).await.unwrap_err();
        assert!(matches!(err, KdebugError::NoPortFound));
    }

    #[tokio::test]
    async fn wait_is_bounded_by_config() {
        let dir = TempDir::new().unwrap();
        let handle = script_handle(&dir, "forward_hang", "exec sleep 30");
        let config = Config {
            tunnel_timeout: Duration::from_millis(200),
            ..Config::default()
        };

        let err = open(&config, &handle).await.unwrap_err();
        assert!(matches!(err, KdebugError::TunnelTimeout(_)));
    }
}
