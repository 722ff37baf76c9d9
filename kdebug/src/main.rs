// kdebug/src/main.rs
use std::process;

use clap::Parser;
use colored::Colorize;
use kdebug_common::config::Config;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::CliArgs;

#[tokio::main]
async fn main() {
    let cli_args = CliArgs::parse();

    let level_filter = match cli_args.verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .with_env_var("KDEBUG_LOG")
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .without_time()
        .try_init();

    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {e}", "Error".red().bold());
            process::exit(1);
        }
    };
    if cli_args.verbose > 0 {
        config.verbose = true;
    }

    if let Err(e) = cli_args.command.run(&config).await {
        eprintln!("{}: {e}", "Error".red().bold());
        process::exit(1);
    }
}
