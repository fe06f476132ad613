//! sectablemgrd - secondary routing table manager daemon
//!
//! Reads route requests from stdin, one per line, and answers each with
//! one response line on stdout. Requests are processed strictly in order.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use sectablemgrd::{dispatch, SecondaryTableMgr, TableMgrConfig, DEFAULT_CONFIG_PATH};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};

/// Secondary policy-routing table manager
#[derive(Parser, Debug)]
#[command(name = "sectablemgrd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    /// Override the path to the `ip` tool
    #[arg(long)]
    ip_path: Option<String>,
}

fn init_logging(log_level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(true),
        )
        .init();
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = TableMgrConfig::load_or_default(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(ip_path) = args.ip_path {
        config.commands.ip_path = ip_path;
    }
    config.validate().context("invalid configuration")?;

    info!(
        "Tables {}-{} via {}",
        config.tables.base_table_number,
        config.last_table_id().unwrap_or(config.tables.base_table_number),
        config.commands.ip_path
    );

    let mut mgr = SecondaryTableMgr::from_config(&config)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = dispatch(&mut mgr, &line).await;
        stdout
            .write_all(format!("{}\n", response).as_bytes())
            .await?;
        stdout.flush().await?;
    }

    info!("Input closed, shutting down");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    info!("--- Starting sectablemgrd ---");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("sectablemgrd failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
