// kdebug/src/cli/attach.rs
use std::env;
use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use dialoguer::{Confirm, Select};
use kdebug_common::config::Config;
use kdebug_common::error::{KdebugError, Result};
use kdebug_common::release::HelperRelease;
use kdebug_core::debugger::DebuggerKind;
use kdebug_core::kube::{Pod, Resolver};
use kdebug_core::session::{self, SessionRequest};
use tracing::debug;

#[derive(Args, Debug)]
pub struct AttachArgs {
    /// Target namespace; prompted for when omitted
    #[arg(short = 'n', long)]
    pub namespace: Option<String>,

    /// Target pod; prompted for when omitted
    #[arg(short = 'p', long)]
    pub pod: Option<String>,

    /// Target container; prompted for when the pod has more than one
    #[arg(short = 'c', long)]
    pub container: Option<String>,

    /// Debugger to attach (dlv, java, nodejs, python, gdb)
    #[arg(short = 'd', long)]
    pub debugger: Option<String>,

    /// Local source root handed to the debugger (defaults to the current directory)
    #[arg(long)]
    pub local_root: Option<PathBuf>,
}

impl AttachArgs {
    pub async fn run(&self, config: &Config) -> Result<()> {
        let release = HelperRelease::builtin()?;
        let resolver = Resolver::new(config);

        let namespace = match &self.namespace {
            Some(ns) => ns.clone(),
            None => {
                let namespaces = resolver.namespaces().await?;
                let labels: Vec<String> = namespaces
                    .iter()
                    .map(|ns| ns.metadata.name.clone())
                    .collect();
                match pick("Please select a namespace", &labels)? {
                    Some(i) => labels[i].clone(),
                    None => return canceled("namespace"),
                }
            }
        };

        let pods = resolver.pods(Some(&namespace)).await?;
        let pod = match &self.pod {
            Some(name) => pods
                .iter()
                .find(|p| p.metadata.name == *name)
                .cloned()
                .ok_or_else(|| {
                    KdebugError::Config(format!("no pod named '{name}' in namespace '{namespace}'"))
                })?,
            None => {
                let labels: Vec<String> = pods
                    .iter()
                    .map(|p| format!("{} ({})", p.metadata.name, p.spec.node_name))
                    .collect();
                match pick("Please select a pod", &labels)? {
                    Some(i) => pods[i].clone(),
                    None => return canceled("pod"),
                }
            }
        };

        let container = self.select_container(&pod)?;
        let container = match container {
            Some(name) => name,
            None => return canceled("container"),
        };

        let debugger = match &self.debugger {
            Some(name) => name.parse::<DebuggerKind>()?,
            None => {
                let labels: Vec<String> = DebuggerKind::ALL
                    .iter()
                    .map(|kind| kind.to_string())
                    .collect();
                match pick("Please select a debugger", &labels)? {
                    Some(i) => DebuggerKind::ALL[i],
                    None => return canceled("debugger"),
                }
            }
        };

        let local_root = match &self.local_root {
            Some(path) => path.clone(),
            None => env::current_dir()?,
        };

        let request = SessionRequest {
            namespace,
            pod: pod.metadata.name.clone(),
            container,
            debugger,
            local_root: local_root.display().to_string(),
        };
        debug!("Attach request: {:?}", request);

        let session = session::attach(config, &release, &request, confirm_download).await?;

        println!("{}", serde_json::to_string_pretty(&session.launch)?);
        eprintln!(
            "{}",
            format!(
                "Tunnel open on 127.0.0.1:{} - press Ctrl-C to end the session",
                session.local_port()
            )
            .green()
        );
        tokio::signal::ctrl_c().await?;
        session.shutdown().await
    }

    fn select_container(&self, pod: &Pod) -> Result<Option<String>> {
        if let Some(name) = &self.container {
            return Ok(Some(name.clone()));
        }
        let containers = pod.containers();
        // a single container needs no prompt
        if containers.len() == 1 {
            return Ok(Some(containers[0].name.clone()));
        }
        let labels: Vec<String> = containers
            .iter()
            .map(|c| format!("{} ({})", c.name, c.image))
            .collect();
        Ok(pick("Please select a container", &labels)?.map(|i| containers[i].name.clone()))
    }
}

fn confirm_download() -> bool {
    Confirm::new()
        .with_prompt("Download the kdebug helper binary?")
        .default(true)
        .interact()
        .unwrap_or(false)
}

fn pick(prompt: &str, labels: &[String]) -> Result<Option<usize>> {
    if labels.is_empty() {
        return Err(KdebugError::Config(format!(
            "nothing to select from ({prompt})"
        )));
    }
    Select::new()
        .with_prompt(prompt)
        .items(labels)
        .default(0)
        .interact_opt()
        .map_err(|e| KdebugError::Config(format!("selection prompt failed: {e}")))
}

fn canceled(what: &str) -> Result<()> {
    eprintln!("choosing {what} canceled - debugging canceled");
    Ok(())
}
