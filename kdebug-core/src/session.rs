// kdebug-core/src/session.rs
//! One debug attempt end to end: helper acquisition, helper invocation,
//! handshake parse, tunnel, launch configuration. Steps are strictly
//! sequential; no step starts before its predecessor's result is in.

use std::path::PathBuf;

use kdebug_common::config::Config;
use kdebug_common::error::Result;
use kdebug_common::release::{HelperRelease, Platform};
use tracing::{debug, info};

use crate::debugger::{self, DebuggerConfig, DebuggerKind};
use crate::exec;
use crate::handshake::{self, Mode, SessionHandle};
use crate::tunnel::{self, Tunnel};

/// The selected target and debugger for one attempt.
#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub namespace: String,
    pub pod: String,
    pub container: String,
    pub debugger: DebuggerKind,
    /// Local source root handed to the debugger configuration.
    pub local_root: String,
}

/// A live debug session: the launch configuration for the external debug
/// engine, plus the tunnel that keeps the endpoint reachable. Dropping
/// the session tears the tunnel down.
pub struct DebugSession {
    pub launch: DebuggerConfig,
    pub handle: SessionHandle,
    pub tunnel: Tunnel,
}

impl DebugSession {
    pub fn local_port(&self) -> u16 {
        self.tunnel.local_port()
    }

    pub async fn shutdown(self) -> Result<()> {
        self.tunnel.shutdown().await
    }
}

pub async fn attach(
    config: &Config,
    release: &HelperRelease,
    request: &SessionRequest,
    consent: impl FnOnce() -> bool,
) -> Result<DebugSession> {
    let helper = helper_path(config, release, consent).await?;
    info!("Using helper binary: {}", helper.display());

    let args = helper_args(config, request);
    let out = exec::run(&helper.display().to_string(), &args, &config.cluster_env()).await?;
    let handle = handshake::parse(Mode::Machine, &out.stdout)?;
    debug!(
        "Helper reported debug target: pod={:?} namespace={:?}",
        handle.remote_pod, handle.remote_namespace
    );

    let tunnel = tunnel::open(config, &handle).await?;
    let launch = debugger::build(
        request.debugger,
        tunnel.local_port(),
        &request.local_root,
        config.remote_path.as_deref(),
        config.python_secret.as_deref(),
    );
    info!(
        "Debug session ready: {} attached through 127.0.0.1:{}",
        request.debugger,
        tunnel.local_port()
    );
    Ok(DebugSession {
        launch,
        handle,
        tunnel,
    })
}

async fn helper_path(
    config: &Config,
    release: &HelperRelease,
    consent: impl FnOnce() -> bool,
) -> Result<PathBuf> {
    if let Some(path) = &config.helper_path {
        debug!("Using pre-installed helper binary: {}", path.display());
        return Ok(path.clone());
    }
    let platform = Platform::current()?;
    kdebug_net::ensure_helper(release, platform, &config.install_root, consent).await
}

fn helper_args(config: &Config, request: &SessionRequest) -> Vec<String> {
    let mut args = config.extra_args.clone();
    args.push("--machine".to_string());
    args.push("--pod".to_string());
    args.push(request.pod.clone());
    args.push("--namespace".to_string());
    args.push(request.namespace.clone());
    args.push("--container".to_string());
    args.push(request.container.clone());
    args.push("--debugger".to_string());
    args.push(request.debugger.as_str().to_string());
    if let Some(pattern) = &config.process_match {
        args.push("--process-match".to_string());
        args.push(pattern.clone());
    }
    if let Some(repo) = &config.container_repository {
        args.push("--container-repo".to_string());
        args.push(repo.clone());
    }
    args
}
