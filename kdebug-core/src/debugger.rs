// kdebug-core/src/debugger.rs
//! Pure mapping from (debugger kind, tunnel port, source roots) to the
//! launch configuration consumed by an external debug-session engine.
//! Field names match what each debug adapter expects, so the serialized
//! form is handed over untouched.

use std::fmt;
use std::str::FromStr;

use kdebug_common::error::KdebugError;
use serde::Serialize;

const LOCALHOST: &str = "127.0.0.1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebuggerKind {
    /// delve; launches in remote mode against the tunneled endpoint.
    Dlv,
    /// JVM attach by port.
    Java,
    /// node inspector attach with localRoot/remoteRoot mapping.
    NodeJs,
    /// ptvsd attach, authenticated by a pre-shared secret.
    Python,
    /// gdbserver attach with an optional path substitution rule.
    Gdb,
}

impl DebuggerKind {
    pub const ALL: [DebuggerKind; 5] = [
        DebuggerKind::Dlv,
        DebuggerKind::Java,
        DebuggerKind::NodeJs,
        DebuggerKind::Python,
        DebuggerKind::Gdb,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DebuggerKind::Dlv => "dlv",
            DebuggerKind::Java => "java",
            DebuggerKind::NodeJs => "nodejs",
            DebuggerKind::Python => "python",
            DebuggerKind::Gdb => "gdb",
        }
    }
}

impl fmt::Display for DebuggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DebuggerKind {
    type Err = KdebugError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dlv" => Ok(DebuggerKind::Dlv),
            "java" => Ok(DebuggerKind::Java),
            // "nodejs8" is the historical spelling used by older setups
            "nodejs" | "nodejs8" => Ok(DebuggerKind::NodeJs),
            "python" => Ok(DebuggerKind::Python),
            "gdb" => Ok(DebuggerKind::Gdb),
            other => Err(KdebugError::UnsupportedDebugger(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DebuggerConfig {
    DlvLaunch(DlvLaunch),
    JavaAttach(JavaAttach),
    NodeAttach(NodeAttach),
    PythonAttach(PythonAttach),
    GdbAttach(GdbAttach),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DlvLaunch {
    pub name: String,
    #[serde(rename = "type")]
    pub adapter: String,
    pub request: String,
    pub mode: String,
    pub port: u16,
    pub host: String,
    pub program: String,
    #[serde(rename = "remotePath")]
    pub remote_path: Option<String>,
    pub env: serde_json::Map<String, serde_json::Value>,
    pub args: Vec<String>,
    #[serde(rename = "showLog")]
    pub show_log: bool,
    pub trace: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JavaAttach {
    #[serde(rename = "type")]
    pub adapter: String,
    pub request: String,
    pub name: String,
    pub port: u16,
    #[serde(rename = "hostName")]
    pub host_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeAttach {
    #[serde(rename = "type")]
    pub adapter: String,
    pub request: String,
    pub name: String,
    pub address: String,
    pub port: u16,
    #[serde(rename = "localRoot")]
    pub local_root: String,
    #[serde(rename = "remoteRoot")]
    pub remote_root: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PythonAttach {
    #[serde(rename = "type")]
    pub adapter: String,
    pub request: String,
    pub name: String,
    #[serde(rename = "localRoot")]
    pub local_root: String,
    #[serde(rename = "remoteRoot")]
    pub remote_root: Option<String>,
    pub port: u16,
    pub secret: String,
    pub host: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GdbAttach {
    #[serde(rename = "type")]
    pub adapter: String,
    pub request: String,
    pub name: String,
    pub target: String,
    pub remote: bool,
    pub cwd: String,
    pub autorun: Vec<String>,
}

/// Deterministic, side-effect free construction of the launch
/// configuration for one debugger kind.
pub fn build(
    kind: DebuggerKind,
    local_port: u16,
    local_root: &str,
    remote_root: Option<&str>,
    python_secret: Option<&str>,
) -> DebuggerConfig {
    match kind {
        DebuggerKind::Dlv => DebuggerConfig::DlvLaunch(DlvLaunch {
            name: "Remote".to_string(),
            adapter: "go".to_string(),
            request: "launch".to_string(),
            mode: "remote".to_string(),
            port: local_port,
            host: LOCALHOST.to_string(),
            program: local_root.to_string(),
            remote_path: remote_root.map(str::to_string),
            env: serde_json::Map::new(),
            args: Vec::new(),
            show_log: true,
            trace: "verbose".to_string(),
        }),
        DebuggerKind::Java => DebuggerConfig::JavaAttach(JavaAttach {
            adapter: "java".to_string(),
            request: "attach".to_string(),
            name: "Attach to java process".to_string(),
            port: local_port,
            host_name: LOCALHOST.to_string(),
        }),
        DebuggerKind::NodeJs => DebuggerConfig::NodeAttach(NodeAttach {
            adapter: "node".to_string(),
            request: "attach".to_string(),
            name: "Attach to Remote".to_string(),
            address: LOCALHOST.to_string(),
            port: local_port,
            local_root: local_root.to_string(),
            remote_root: remote_root.map(str::to_string),
        }),
        DebuggerKind::Python => DebuggerConfig::PythonAttach(PythonAttach {
            adapter: "python".to_string(),
            request: "attach".to_string(),
            name: "Python: Attach".to_string(),
            local_root: local_root.to_string(),
            remote_root: remote_root.map(str::to_string),
            port: local_port,
            secret: python_secret.unwrap_or_default().to_string(),
            host: LOCALHOST.to_string(),
        }),
        DebuggerKind::Gdb => {
            let autorun = match remote_root {
                Some(remote) => vec![format!(
                    "set substitute-path \"{remote}\" \"{local_root}\""
                )],
                None => Vec::new(),
            };
            DebuggerConfig::GdbAttach(GdbAttach {
                adapter: "gdb".to_string(),
                request: "attach".to_string(),
                name: "Attach to gdbserver".to_string(),
                target: format!("localhost:{local_port}"),
                remote: true,
                cwd: local_root.to_string(),
                autorun,
            })
        }
    }
}
