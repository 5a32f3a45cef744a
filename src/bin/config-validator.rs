//! # Standings Configuration Validator
//!
//! Command-line tool for validating standings configuration files before the
//! automation engine is started with them.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use standings_core::config::{ConfigManager, StandingsConfig};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "config-validator")]
#[command(about = "Validate standings configuration files")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Base configuration file
    #[arg(short, long, default_value = "config/standings.toml")]
    config: PathBuf,

    /// Environment overlay to apply (development, test, production)
    #[arg(short, long, default_value = "development")]
    environment: String,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate the file and its overlay
    Validate,

    /// Print the effective configuration as JSON
    Show,

    /// Print the built-in defaults as JSON
    Defaults,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let _subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .try_init();

    let result = match &cli.command {
        Some(Commands::Validate) | None => validate(&cli),
        Some(Commands::Show) => show(&cli),
        Some(Commands::Defaults) => defaults(),
    };

    match result {
        Ok(()) => {
            info!("Configuration check completed successfully");
            process::exit(0);
        }
        Err(e) => {
            error!("Configuration check failed: {:#}", e);
            eprintln!("❌ {e:#}");
            process::exit(1);
        }
    }
}

fn load(cli: &Cli) -> Result<std::sync::Arc<ConfigManager>> {
    ConfigManager::load_from_file(&cli.config, &cli.environment).with_context(|| {
        format!(
            "loading {} for environment {}",
            cli.config.display(),
            cli.environment
        )
    })
}

fn validate(cli: &Cli) -> Result<()> {
    println!("🔧 Validating Standings Configuration");
    println!("File: {}", cli.config.display());
    println!("Environment: {}", cli.environment);
    println!();

    let manager = load(cli)?;
    let config = manager.config();

    println!("✅ Configuration loaded and validated");
    println!(
        "   queue: concurrency={} timeout={}ms retries={}",
        config.queue.concurrency, config.queue.job_timeout_ms, config.queue.max_retries
    );
    println!(
        "   backoff: base={}ms x{} max={}ms jitter={}",
        config.backoff.base_delay_ms,
        config.backoff.multiplier,
        config.backoff.max_delay_ms,
        config.backoff.jitter_enabled
    );
    println!(
        "   snapshots: store={} max_per_table={}",
        config
            .snapshots
            .storage_dir
            .as_ref()
            .map_or_else(|| "memory".to_string(), |dir| dir.display().to_string()),
        config.snapshots.max_per_table
    );
    println!("   triggers: enabled={}", config.triggers.enabled);
    Ok(())
}

fn show(cli: &Cli) -> Result<()> {
    let manager = load(cli)?;
    let rendered = serde_json::to_string_pretty(manager.config())
        .context("rendering effective configuration")?;
    println!("{rendered}");
    Ok(())
}

fn defaults() -> Result<()> {
    let rendered = serde_json::to_string_pretty(&StandingsConfig::default())
        .context("rendering default configuration")?;
    println!("{rendered}");
    Ok(())
}
