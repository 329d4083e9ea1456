// CLASSIFICATION: COMMUNITY
// Filename: main.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-15

//! Serve a queen over TCP and log its lifecycle events.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use hivequeen::transport::tcp::TcpEndpoint;
use hivequeen::{
    PooledWorkforceFactory, PopulationStrategy, Queen, QueenConfig, QueenEvent, WorkforceOptions,
};
use log::{info, LevelFilter};

#[derive(Parser)]
#[command(about = "Worker provider queen")]
struct Cli {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Accept worker providers on a TCP address
    Serve {
        #[arg(long, default_value = "127.0.0.1:9300")]
        listen: String,
        /// TOML config file; HIVEQUEEN_* variables override it
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        registration_timeout_ms: Option<u64>,
        /// Create one workforce with this population strategy at startup
        #[arg(long)]
        workforce: Option<PopulationStrategy>,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let mut builder =
        env_logger::Builder::from_env(Env::default().default_filter_or(default_level.as_str()));
    builder.format_timestamp_millis();
    let _ = builder.try_init();
}

fn load_config(path: Option<&PathBuf>, timeout_ms: Option<u64>) -> Result<QueenConfig> {
    let base = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            QueenConfig::from_toml_str(&text)?
        }
        None => QueenConfig::default(),
    };
    let mut config = base.with_env()?;
    if let Some(ms) = timeout_ms {
        config.registration_timeout = Duration::from_millis(ms);
    }
    Ok(config)
}

async fn serve(
    listen: &str,
    config: QueenConfig,
    workforce: Option<PopulationStrategy>,
) -> Result<()> {
    let endpoint = TcpEndpoint::bind(listen)
        .await
        .with_context(|| format!("binding {listen}"))?;
    info!("listening on {}", endpoint.local_addr()?);
    let (incoming, _accept) = endpoint.serve();

    let queen = Queen::spawn(config, Arc::new(PooledWorkforceFactory::new()), incoming);
    let mut events = queen.events().subscribe();

    if let Some(strategy) = workforce {
        let wf = queen
            .get_workforce(WorkforceOptions::with_populate(strategy))
            .await?;
        info!("created {} ({strategy})", wf.id());
    }

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(QueenEvent::Dead) | None => break,
                Some(event) => info!("event {event:?}"),
            },
            signal = tokio::signal::ctrl_c() => {
                signal.context("waiting for ctrl-c")?;
                info!("shutting down");
                queen.kill().await?;
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Command::Serve {
            listen,
            config,
            registration_timeout_ms,
            workforce,
        } => {
            let config = load_config(config.as_ref(), registration_timeout_ms)?;
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("building tokio runtime")?;
            runtime.block_on(serve(&listen, config, workforce))
        }
    }
}
