// kdebug/src/cli.rs
//! Defines the command-line argument structure using clap.
use clap::{ArgAction, Parser, Subcommand};
use kdebug_common::config::Config;
use kdebug_common::error::Result;

pub mod attach;
pub mod namespaces;
pub mod pods;

use crate::cli::attach::AttachArgs;
use crate::cli::namespaces::NamespacesArgs;
use crate::cli::pods::PodsArgs;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, name = "kdebug", bin_name = "kdebug")]
#[command(propagate_version = true)]
pub struct CliArgs {
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Attach a debugger to a container in the cluster
    Attach(AttachArgs),
    /// List namespaces visible to the configured cluster CLI
    Namespaces(NamespacesArgs),
    /// List pods in a namespace (or across all namespaces)
    Pods(PodsArgs),
}

impl Command {
    pub async fn run(&self, config: &Config) -> Result<()> {
        match self {
            Self::Attach(command) => command.run(config).await,
            Self::Namespaces(command) => command.run(config).await,
            Self::Pods(command) => command.run(config).await,
        }
    }
}
