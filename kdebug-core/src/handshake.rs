// kdebug-core/src/handshake.rs
//! Parsing of the helper binary's stdout into a session handle. Two wire
//! formats exist: current helpers asked for `--machine` print a single
//! JSON object; older helpers print a `pod.name: <name>` line. The caller
//! picks the mode that matches the flags it passed, never by sniffing the
//! content.

use std::sync::OnceLock;

use kdebug_common::error::{KdebugError, Result};
use regex::Regex;
use serde::Deserialize;

/// Debug port the legacy helper always listens on inside the pod.
pub const LEGACY_DEBUG_PORT: u16 = 1235;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// `--machine` was passed; stdout is one JSON object.
    Machine,
    /// Pre-machine helper; stdout is scraped for a `pod.name:` line.
    Legacy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardSpec {
    /// Verbatim port-forward command reported by the helper.
    Command(String),
    /// Pod to forward to, for helpers that only report the pod name.
    Target { pod: String, remote_port: u16 },
}

/// Identity of the remote debug endpoint created by one helper
/// invocation. Discarded when the session ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    pub remote_pod: Option<String>,
    pub remote_namespace: Option<String>,
    pub forward: ForwardSpec,
}

#[derive(Deserialize)]
struct MachineReport {
    #[serde(rename = "PortForwardCmd")]
    port_forward_cmd: String,
}

pub fn parse(mode: Mode, stdout: &str) -> Result<SessionHandle> {
    match mode {
        Mode::Machine => parse_machine(stdout),
        Mode::Legacy => parse_legacy(stdout),
    }
}

fn parse_machine(stdout: &str) -> Result<SessionHandle> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Err(KdebugError::Handshake(
            "helper produced no output".to_string(),
        ));
    }
    let report: MachineReport = serde_json::from_str(trimmed).map_err(|e| {
        KdebugError::Handshake(format!("helper output is not valid JSON: {e}: {trimmed}"))
    })?;
    if report.port_forward_cmd.trim().is_empty() {
        return Err(KdebugError::Handshake(
            "helper reported an empty port-forward command".to_string(),
        ));
    }
    let (remote_pod, remote_namespace) = forward_cmd_target(&report.port_forward_cmd);
    Ok(SessionHandle {
        remote_pod,
        remote_namespace,
        forward: ForwardSpec::Command(report.port_forward_cmd),
    })
}

fn parse_legacy(stdout: &str) -> Result<SessionHandle> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"pod\.name:\s+(\S+)").unwrap());
    let pod = re
        .captures(stdout)
        .map(|c| c[1].to_string())
        .ok_or_else(|| {
            KdebugError::Handshake("no pod.name line in helper output".to_string())
        })?;
    Ok(SessionHandle {
        remote_pod: Some(pod.clone()),
        remote_namespace: None,
        forward: ForwardSpec::Target {
            pod,
            remote_port: LEGACY_DEBUG_PORT,
        },
    })
}

/// Best-effort recovery of the pod and namespace from a reported forward
/// command, for display only. The command itself stays authoritative.
fn forward_cmd_target(cmd: &str) -> (Option<String>, Option<String>) {
    let tokens: Vec<&str> = cmd.split_whitespace().collect();
    let mut pod = None;
    let mut namespace = None;
    for (i, token) in tokens.iter().enumerate() {
        match *token {
            "port-forward" => {
                pod = tokens
                    .get(i + 1)
                    .filter(|t| !t.starts_with('-') && !t.contains(':'))
                    .map(|t| t.to_string());
            }
            "-n" | "--namespace" => {
                namespace = tokens.get(i + 1).map(|t| t.to_string());
            }
            t => {
                if let Some(ns) = t.strip_prefix("--namespace=") {
                    namespace = Some(ns.to_string());
                }
            }
        }
    }
    (pod, namespace)
}
