use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use brownian_forecast::config::{Config, ConfigOverrides};
use brownian_forecast::input::parse_prices;
use brownian_forecast::simulation::RunControl;
use brownian_forecast::ModelRegistry;

#[derive(Parser)]
#[command(name = "brownian-forecast")]
#[command(version, about = "Monte Carlo price forecasts and walk-forward signals", long_about = None)]
struct Cli {
    /// Config file (default: $BROWNIAN_FORECAST_CONFIG or config/default.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List available models and their parameters
    Models,
    /// Forecast the next steps from the trailing window of a price file
    Predict(ForecastArgs),
    /// Walk-forward BUY/SELL/HOLD signals over a price file
    Signals {
        #[command(flatten)]
        args: ForecastArgs,

        /// Expected-return threshold for BUY/SELL
        #[arg(long, default_value = "0.02")]
        threshold: f64,
    },
}

#[derive(Args)]
struct ForecastArgs {
    /// Model kind: heston, garch or gbm
    #[arg(short, long, default_value = "gbm")]
    model: String,

    /// Calibration window in prices
    #[arg(long)]
    window: Option<usize>,

    /// Forecast horizon in bars
    #[arg(long)]
    steps: Option<usize>,

    /// Number of simulated paths
    #[arg(long)]
    sims: Option<usize>,

    /// Base seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// File with one price per line (commas and whitespace also separate)
    prices: PathBuf,
}

impl ForecastArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            window_size: self.window,
            prediction_steps: self.steps,
            num_simulations: self.sims,
        }
    }
}

fn read_prices(path: &Path) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_prices(&text).with_context(|| format!("failed to parse {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::try_new(&config.logging.level)
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    });
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(cli: Cli, config: &Config) -> Result<()> {
    let registry = ModelRegistry::new(config).context("invalid model configuration")?;
    let run_id = uuid::Uuid::new_v4();

    match cli.command {
        Command::Models => print_json(&registry.catalog()),
        Command::Predict(args) => {
            let span = tracing::info_span!("predict", %run_id, model = %args.model);
            let _guard = span.enter();
            let prices = read_prices(&args.prices)?;
            let result = registry.get_model(&args.model)?.predict_with(
                &prices,
                &args.overrides(),
                args.seed,
                &RunControl::new(),
            )?;
            print_json(&result)
        }
        Command::Signals { args, threshold } => {
            let span = tracing::info_span!("signals", %run_id, model = %args.model);
            let _guard = span.enter();
            let prices = read_prices(&args.prices)?;
            let report = registry.get_model(&args.model)?.generate_signals_with(
                &prices,
                &args.overrides(),
                threshold,
                args.seed,
                &RunControl::new(),
            )?;
            print_json(&report)
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {:#}", e);
            std::process::exit(1);
        }
    };
    init_tracing(&config);
    match &config.source {
        Some(path) => tracing::debug!(path = %path.display(), "Loaded config"),
        None => tracing::warn!("No config file found, using built-in defaults"),
    }

    if let Err(e) = run(cli, &config) {
        tracing::error!(error = %e, "Command failed");
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
