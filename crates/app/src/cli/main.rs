//! Sound pool CLI

mod script;
mod simulate;

use anyhow::Context;
use clap::{Parser, Subcommand};
use script::Script;
use simulate::Simulation;
use soundpool_core::domain::args::ArgTable;
use soundpool_core::domain::config::SoundpoolConfig;
use soundpool_infra::audio::SoundLoader;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "soundpool")]
#[command(about = "Bounded playback-channel allocator for positional sound effects", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Ini file with `key=value` overrides
    #[arg(long, global = true)]
    ini: Option<PathBuf>,

    /// Single `key=value` override, applied after the ini file
    #[arg(short = 'a', long = "arg", value_name = "KEY=VALUE", global = true)]
    args: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the effective configuration and the sound load report
    Check,

    /// Run a playback script against virtual devices
    Simulate {
        script: PathBuf,

        /// Follow the wall clock instead of jumping on each `tick`
        #[arg(long)]
        realtime: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Sound pool starting...");

    let config = load_config(&cli).await?;

    match &cli.command {
        Commands::Check => check(&config).await,
        Commands::Simulate { script, realtime } => {
            let text = tokio::fs::read_to_string(script)
                .await
                .with_context(|| format!("reading script {}", script.display()))?;
            let script = Script::parse(&text)?;
            let mut simulation = Simulation::new(&config, &script, *realtime).await?;
            simulation.run(&script).await
        }
    }
}

/// Config file, then ini overrides, then command line overrides
async fn load_config(cli: &Cli) -> anyhow::Result<SoundpoolConfig> {
    let path = match &cli.config {
        Some(path) => Some(path.clone()),
        None => SoundpoolConfig::default_path().ok().filter(|path| path.exists()),
    };

    let mut config = match path {
        Some(path) => SoundpoolConfig::load_from_file(&path)
            .await
            .with_context(|| format!("loading config {}", path.display()))?,
        None => {
            info!("No config file, using defaults");
            SoundpoolConfig::default()
        }
    };

    let mut args = ArgTable::new();
    if let Some(ini) = &cli.ini {
        args.load_file(ini)
            .await
            .with_context(|| format!("loading settings {}", ini.display()))?;
    }
    args.extend(&cli.args);
    config.apply_args(&args);
    config.validate().context("invalid settings")?;

    Ok(config)
}

async fn check(config: &SoundpoolConfig) -> anyhow::Result<()> {
    println!("{}", toml::to_string_pretty(config)?);

    let (bank, report) = SoundLoader::from_config(&config.resources)
        .load()
        .await
        .with_context(|| format!("loading sounds from {}", config.resources.folder.display()))?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    if report.is_complete() {
        info!(sounds = bank.len(), "All sounds loaded");
    } else {
        warn!(failed = report.failed.len(), "Some sounds failed to load");
    }
    Ok(())
}
