//! Loaner CLI - exercise pooled invocation targets from the command line.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use loaner_core::{MaxSize, WhenExhausted};
use std::path::PathBuf;

mod commands;
mod logging;
mod settings;

use commands::PoolKind;
use logging::LogFormat;
use settings::Settings;

/// Loaner - bounded pools of invocation targets
#[derive(Parser, Debug)]
#[command(name = "loaner")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run concurrent invocations against a pool and report its statistics
    Simulate {
        /// Path to a configuration file (YAML, TOML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Pool implementation
        #[arg(long, value_enum, default_value_t = PoolKind::Generic)]
        pool: PoolKind,

        /// Maximum pool size; negative means unbounded
        #[arg(long, allow_negative_numbers = true)]
        max_size: Option<i64>,

        /// Behaviour when every target is borrowed
        #[arg(long, value_enum)]
        policy: Option<Policy>,

        /// Worker threads
        #[arg(long)]
        threads: Option<usize>,

        /// Invocations per thread
        #[arg(long)]
        iterations: Option<usize>,

        /// Milliseconds each invocation holds its target
        #[arg(long)]
        hold_ms: Option<u64>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config {
        /// Path to a configuration file (YAML, TOML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Policy {
    Fail,
    Block,
}

impl From<Policy> for WhenExhausted {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Fail => Self::Fail,
            Policy::Block => Self::Block,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(logging::level_for(cli.verbose), cli.log_format);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Simulate {
            config,
            pool,
            max_size,
            policy,
            threads,
            iterations,
            hold_ms,
            json,
        } => {
            let mut settings =
                Settings::load(config.as_deref()).context("failed to load settings")?;
            if let Some(max_size) = max_size {
                settings.pool.max_size = MaxSize::from(max_size);
            }
            if let Some(policy) = policy {
                settings.pool.when_exhausted = policy.into();
            }
            if let Some(threads) = threads {
                settings.simulation.threads = threads;
            }
            if let Some(iterations) = iterations {
                settings.simulation.iterations = iterations;
            }
            if let Some(hold_ms) = hold_ms {
                settings.simulation.hold_ms = hold_ms;
            }
            commands::simulate(&settings, pool, json).context("simulation failed")?;
        }
        Commands::Config { config } => {
            let settings = Settings::load(config.as_deref()).context("failed to load settings")?;
            commands::show_config(&settings)?;
        }
    }
    Ok(())
}
