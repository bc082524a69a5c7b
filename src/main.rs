mod check;
mod cli;
mod config;
mod report;
mod utils;

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use config::Settings;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // 日志写 stderr，stdout 留给面板
    let filter = if cli.verbose {
        EnvFilter::new("info,kubecheck=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Commands::Check { checks, format, output_dir } => {
            let settings = Settings::from_args(cli.kubeconfig, cli.context, &checks)?;
            let code = check::run_check(settings, format, &output_dir)
                .await
                .with_context(|| format!("health check failed, no report in {}", output_dir.display()))?;
            Ok(code)
        }
        Commands::Watch { checks, interval } => {
            if interval == 0 {
                anyhow::bail!("--interval must be at least 1 second");
            }
            let settings = Settings::from_args(cli.kubeconfig, cli.context, &checks)?;
            check::run_watch(settings, Duration::from_secs(interval)).await?;
            Ok(0)
        }
    }
}
