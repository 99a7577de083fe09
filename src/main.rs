//! Command-line front end: runs one operation and prints its result
//! fragment as JSON on stdout. Logs go to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use fileconnect::{Cli, FileSystemManager};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let manager =
        FileSystemManager::new(cli.fs_options()).context("failed to set up file systems")?;
    let result = cli.operation.execute(&manager, &cli.parameters()).await;

    println!("{}", result.to_json(cli.pretty)?);
    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
