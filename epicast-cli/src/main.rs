//! Epicast CLI — evaluate and forecast commands.
//!
//! Commands:
//! - `evaluate` — train/test evaluation pass; prints the metric battery and
//!   saves manifest/predictions/report artifacts
//! - `forecast` — fit on the full history and predict an unseen future year;
//!   writes a predictions CSV

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};

use epicast_core::data::load_dataset;
use epicast_core::models::{AutoAr, Gbt};
use epicast_runner::{
    forecast_future, run_tabular, run_univariate, save_artifacts, save_forecast_csv, RunConfig,
    RunResult, Variant,
};

#[derive(Parser)]
#[command(
    name = "epicast",
    about = "Epicast CLI — pollution-mortality forecasting pipeline"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VariantArg {
    Univariate,
    Tabular,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a train/test evaluation pass and save artifacts.
    Evaluate {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory of per-year CSV partitions (required without --config).
        #[arg(long)]
        data: Option<PathBuf>,

        /// Modeling strategy.
        #[arg(long, value_enum, default_value_t = VariantArg::Univariate)]
        variant: VariantArg,

        /// Last year included in the training set.
        #[arg(long, default_value_t = 2018)]
        train_cutoff: i32,

        /// Year to evaluate against.
        #[arg(long, default_value_t = 2019)]
        test_year: i32,

        /// Cross-validation folds for the tabular grid search.
        #[arg(long, default_value_t = 5)]
        cv_folds: usize,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Fit on the full history and predict a future year.
    Forecast {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory of per-year CSV partitions (required without --config).
        #[arg(long)]
        data: Option<PathBuf>,

        /// Year to forecast.
        #[arg(long, default_value_t = 2020)]
        year: i32,

        /// Output CSV path.
        #[arg(long, default_value = "predictions.csv")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate {
            config,
            data,
            variant,
            train_cutoff,
            test_year,
            cv_folds,
            output_dir,
        } => run_evaluate(
            config,
            data,
            variant,
            train_cutoff,
            test_year,
            cv_folds,
            output_dir,
        ),
        Commands::Forecast {
            config,
            data,
            year,
            output,
        } => run_forecast(config, data, year, output),
    }
}

/// Build a RunConfig from either a config file or command-line flags.
fn resolve_config(
    config_path: Option<PathBuf>,
    data: Option<PathBuf>,
) -> Result<RunConfig> {
    match (config_path, data) {
        (Some(_), Some(_)) => bail!("--config and --data are mutually exclusive"),
        (Some(path), None) => Ok(RunConfig::from_file(&path)?),
        (None, Some(dir)) => Ok(RunConfig::for_data_dir(dir)),
        (None, None) => bail!("one of --config or --data is required"),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_evaluate(
    config_path: Option<PathBuf>,
    data: Option<PathBuf>,
    variant: VariantArg,
    train_cutoff: i32,
    test_year: i32,
    cv_folds: usize,
    output_dir: PathBuf,
) -> Result<()> {
    let mut config = resolve_config(config_path.clone(), data)?;
    if config_path.is_none() {
        // Flags drive the run when no config file is given.
        config.variant = match variant {
            VariantArg::Univariate => Variant::Univariate,
            VariantArg::Tabular => Variant::Tabular,
        };
        config.train_cutoff_year = train_cutoff;
        config.test_year = test_year;
        config.cv_folds = cv_folds;
        config.output_dir = output_dir;
    }

    let dataset = load_dataset(&config.data_dir, &config.schema)?;
    println!(
        "Loaded {} records, {} entities, years {:?}",
        dataset.len(),
        dataset.entities().len(),
        dataset.years()
    );

    let result = match config.variant {
        Variant::Univariate => run_univariate(
            &dataset,
            config.train_cutoff_year,
            config.test_year,
            &AutoAr::default(),
        )?,
        Variant::Tabular => run_tabular(
            &dataset,
            config.train_cutoff_year,
            config.test_year,
            &Gbt::new(),
            &config.grid,
            config.cv_folds,
        )?,
    };

    print_summary(&result);

    let run_dir = save_artifacts(&result, &config.output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());

    Ok(())
}

fn run_forecast(
    config_path: Option<PathBuf>,
    data: Option<PathBuf>,
    year: i32,
    output: PathBuf,
) -> Result<()> {
    let config = resolve_config(config_path, data)?;

    let dataset = load_dataset(&config.data_dir, &config.schema)?;
    let forecast = forecast_future(&dataset, year, &AutoAr::default())?;

    println!(
        "Forecast for {}: {} entities predicted, {} skipped ({:.3}s)",
        forecast.target_year,
        forecast.predictions.len(),
        forecast.skipped.len(),
        forecast.fit_seconds
    );
    for s in &forecast.skipped {
        println!("  skipped {}: {:?}", s.entity_id, s.reason);
    }

    save_forecast_csv(&forecast, &output)?;
    println!("Predictions written to: {}", output.display());

    Ok(())
}

fn print_summary(result: &RunResult) {
    println!();
    println!("=== Evaluation Result ===");
    let variant = match result.variant {
        Variant::Univariate => "univariate",
        Variant::Tabular => "tabular",
    };
    println!("Variant:        {variant}");
    println!(
        "Split:          train <= {}, test == {}",
        result.train_cutoff_year, result.test_year
    );
    println!(
        "Entities:       {} ({} predicted, {} skipped)",
        result.entity_count,
        result.predictions.len(),
        result.skipped.len()
    );
    if let Some(ref params) = result.best_params {
        println!(
            "Best params:    trees={}, lr={}, depth={}, subsample={}",
            params.n_trees, params.learning_rate, params.max_depth, params.subsample
        );
    }
    println!();
    println!("--- Metrics ---");
    println!("MSE:            {:.4}", result.metrics.mse);
    println!("RMSE:           {:.4}", result.metrics.rmse);
    println!("R2:             {:.4}", result.metrics.r2);
    println!("Expl. Variance: {:.4}", result.metrics.explained_variance);
    println!("MAE:            {:.4}", result.metrics.mae);
    println!("Median AE:      {:.4}", result.metrics.median_ae);
    println!("Fit time:       {:.3}s", result.fit_seconds);
    for s in &result.skipped {
        println!("WARNING: skipped {}: {:?}", s.entity_id, s.reason);
    }
    println!();
}
