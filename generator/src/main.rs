use clap::Parser;
use std::{path::PathBuf, process::exit};
use sweep_generator::{
    config::{Overrides, SweepConfig, TOOLKIT_ENV},
    generator::Generator,
    storage::Storage,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Prepare a live point sweep of nested sampling runs as a Condor dag
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// YAML config, every missing value falls back to its default
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base directory for data, priors, submit file and dag
    #[arg(short, long)]
    base: Option<PathBuf>,

    /// Root of the analysis toolkit installation
    #[arg(long, env = TOOLKIT_ENV)]
    toolkit: Option<PathBuf>,

    /// Seed for the synthetic noise
    #[arg(long)]
    seed: Option<u64>,

    /// Live point values to sweep over, replaces the configured axis
    #[arg(long, num_args = 1..)]
    live: Option<Vec<usize>>,

    /// Print the effective config as YAML and exit
    #[arg(long)]
    dump_config: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match cli.config.as_deref().map(SweepConfig::load) {
        Some(Ok(config)) => config,
        Some(Err(e)) => {
            error!("Failed to load config: {e}");
            exit(1)
        }
        None => SweepConfig::default(),
    };

    config.apply(Overrides {
        base: cli.base,
        toolkit: cli.toolkit,
        seed: cli.seed,
        live: cli.live,
    });

    if cli.dump_config {
        match config.to_yaml() {
            Ok(yaml) => {
                print!("{yaml}");
                return;
            }
            Err(e) => {
                error!("Failed to serialize config: {e}");
                exit(1)
            }
        }
    }

    if config.preflight_checks() {
        error!("Config contains errors, aborting");
        exit(1)
    }

    let generator = match Generator::from_config(config, None) {
        Ok(generator) => generator,
        Err(e) => {
            error!("{e}");
            exit(1)
        }
    };

    match generator.run(&mut Storage::local()) {
        Ok(summary) => info!(
            "Done, {} jobs ready in {}",
            summary.total(),
            summary.dag.display()
        ),
        Err(e) => {
            error!("Generation failed: {e}");
            exit(1)
        }
    }
}
