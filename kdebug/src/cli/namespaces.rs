// kdebug/src/cli/namespaces.rs
use clap::Args;
use colored::Colorize;
use kdebug_common::config::Config;
use kdebug_common::error::Result;
use kdebug_core::kube::Resolver;

#[derive(Args, Debug)]
pub struct NamespacesArgs {}

impl NamespacesArgs {
    pub async fn run(&self, config: &Config) -> Result<()> {
        let namespaces = Resolver::new(config).namespaces().await?;
        if namespaces.is_empty() {
            eprintln!("{}", "No namespaces visible".yellow());
            return Ok(());
        }
        for namespace in namespaces {
            println!("{}", namespace.metadata.name);
        }
        Ok(())
    }
}
