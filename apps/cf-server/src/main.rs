use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use cf_app::{AppResult, PlantConfig, ReactorServer, RunOptions, Runtime, load_yaml};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cf-server")]
#[command(
    about = "ChemFlow - Reactor process model served over a typed address space",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the plant and serve it until interrupted
    Run {
        /// Path to the plant YAML file (defaults apply without one)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Endpoint address, overrides `listen` from the config
        #[arg(long)]
        listen: Option<String>,
        /// Model tick period in milliseconds
        #[arg(long)]
        period_ms: Option<u64>,
        /// Stop after this many model ticks
        #[arg(long)]
        ticks: Option<u64>,
    },
    /// Print the bound address space with current values
    Browse {
        /// Path to the plant YAML file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Validate a plant file and print the effective configuration
    CheckConfig {
        /// Path to the plant YAML file
        config_path: PathBuf,
    },
}

fn main() -> AppResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            listen,
            period_ms,
            ticks,
        } => cmd_run(config.as_deref(), listen, period_ms, ticks),
        Commands::Browse { config } => cmd_browse(config.as_deref()),
        Commands::CheckConfig { config_path } => cmd_check_config(&config_path),
    }
}

fn load_config(path: Option<&Path>) -> AppResult<PlantConfig> {
    match path {
        Some(path) => Ok(load_yaml(path)?),
        None => Ok(PlantConfig::default()),
    }
}

fn cmd_run(
    config_path: Option<&Path>,
    listen: Option<String>,
    period_ms: Option<u64>,
    ticks: Option<u64>,
) -> AppResult<()> {
    let mut config = load_config(config_path)?;
    if listen.is_some() {
        config.listen = listen;
    }
    if let Some(period_ms) = period_ms {
        config.tick_period_ms = period_ms;
    }

    let mut runtime = Runtime::new(&config)?;
    if let Some(endpoint) = runtime.endpoint() {
        println!("Serving on {}", endpoint.local_addr()?);
    }

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        if let Err(err) = ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst)) {
            warn!(%err, "failed to install interrupt handler");
        }
    }

    let summary = runtime.run_until(&stop, RunOptions { max_ticks: ticks });
    runtime.shutdown();

    println!(
        "✓ Stopped after {} ticks, {} requests served ({:.1} s)",
        summary.ticks,
        summary.requests,
        summary.elapsed.as_secs_f64()
    );
    Ok(())
}

fn cmd_browse(config_path: Option<&Path>) -> AppResult<()> {
    let config = load_config(config_path)?;
    let server = ReactorServer::build(&config, Instant::now())?;
    for line in server.tree() {
        println!("{line}");
    }
    info!(instances = server.instances().len(), "address space listed");
    server.shutdown();
    Ok(())
}

fn cmd_check_config(config_path: &Path) -> AppResult<()> {
    println!("Validating plant file: {}", config_path.display());
    let config = load_yaml(config_path)?;
    println!("✓ Plant file is valid");
    print!("{}", config.to_yaml()?);
    Ok(())
}
