// kdebug/src/cli/pods.rs
use clap::Args;
use colored::Colorize;
use kdebug_common::config::Config;
use kdebug_common::error::Result;
use kdebug_core::kube::Resolver;

#[derive(Args, Debug)]
pub struct PodsArgs {
    /// Namespace to list; all namespaces when omitted
    #[arg(short = 'n', long)]
    pub namespace: Option<String>,
}

impl PodsArgs {
    pub async fn run(&self, config: &Config) -> Result<()> {
        let pods = Resolver::new(config)
            .pods(self.namespace.as_deref())
            .await?;
        if pods.is_empty() {
            eprintln!("{}", "No pods found".yellow());
            return Ok(());
        }
        for pod in pods {
            let containers: Vec<&str> = pod
                .containers()
                .iter()
                .map(|c| c.name.as_str())
                .collect();
            println!(
                "{}/{} ({}) [{}]",
                pod.metadata.namespace.bold(),
                pod.metadata.name,
                pod.spec.node_name,
                containers.join(", ")
            );
        }
        Ok(())
    }
}
