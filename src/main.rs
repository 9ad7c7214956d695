//! Command-line interface: `train`, `predict`, and `cv` subcommands.

use clap::{Parser, Subcommand};
use histboost::metrics::Metric;
use histboost::{BoosterConfig, DataMatrix, GradientBooster, HistBoostError, Task};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

fn parse_task(s: &str) -> Result<Task, String> {
    match s {
        "reg" => Ok(Task::Regression),
        "binary" => Ok(Task::Binary),
        _ => Err(format!("invalid task '{}', expected 'reg' or 'binary'", s)),
    }
}

/// Hyperparameter flags shared by `train` and `cv`, named after the
/// configuration options one-to-one.
#[derive(Debug, clap::Args)]
struct TrainingFlags {
    /// Task type (reg = regression, binary = binary classification)
    #[arg(long, default_value = "reg", value_parser = parse_task)]
    task: Task,

    /// Number of boosting rounds
    #[arg(long = "nrounds", default_value_t = 100)]
    n_rounds: usize,

    /// Learning rate
    #[arg(long = "lr", default_value_t = 0.1)]
    learning_rate: f32,

    /// Maximum depth of trees
    #[arg(long = "max_depth", default_value_t = 6)]
    max_depth: usize,

    /// Minimum number of instances in a leaf
    #[arg(long = "min_data_in_leaf", default_value_t = 20)]
    min_data_in_leaf: usize,

    /// Minimum sum of instance weight in a child
    #[arg(long = "min_child_weight", default_value_t = 1.0)]
    min_child_weight: f32,

    /// L2 regularization
    #[arg(long = "reg_lambda", default_value_t = 1.0)]
    reg_lambda: f32,

    /// Number of bins for the feature histograms
    #[arg(long = "nbins", default_value_t = 256)]
    n_bins: u16,

    /// Subsample ratio of rows per round
    #[arg(long, default_value_t = 1.0)]
    subsample: f32,

    /// Column sample ratio (reserved)
    #[arg(long, default_value_t = 1.0)]
    colsample: f32,

    /// Evaluation metric (rmse, mae, logloss, auc); defaults by task
    #[arg(long)]
    metric: Option<String>,

    /// Random seed
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Number of threads (-1 = all)
    #[arg(long = "nthreads", default_value_t = -1, allow_negative_numbers = true)]
    n_threads: i32,
}

impl TrainingFlags {
    fn to_config(&self) -> Result<BoosterConfig, HistBoostError> {
        let metric = match &self.metric {
            Some(name) => Metric::from_str(name)?,
            None => self.task.objective().default_metric(),
        };
        Ok(BoosterConfig {
            task: self.task,
            n_rounds: self.n_rounds,
            learning_rate: self.learning_rate,
            max_depth: self.max_depth,
            min_data_in_leaf: self.min_data_in_leaf,
            min_child_weight: self.min_child_weight,
            reg_lambda: self.reg_lambda,
            n_bins: self.n_bins,
            subsample: self.subsample,
            colsample: self.colsample,
            seed: self.seed,
            n_threads: self.n_threads,
            metric,
        })
    }
}

#[derive(Parser)]
#[command(name = "histboost")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Histogram-based gradient boosting for regression and binary classification")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model and save it as native JSON
    Train {
        /// Input data file (CSV with a header row)
        #[arg(long)]
        data: PathBuf,

        /// 0-based column index of the label
        #[arg(long)]
        label: i64,

        /// Output model file path
        #[arg(long)]
        out: PathBuf,

        #[command(flatten)]
        flags: TrainingFlags,
    },
    /// Predict with a saved model
    Predict {
        /// Input data file (CSV with a header row)
        #[arg(long)]
        data: PathBuf,

        /// Model file to load
        #[arg(long)]
        model: PathBuf,

        /// 0-based label column to skip in the input, -1 for none
        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        label: i64,

        /// Output file for predictions, one per line; stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// K-fold cross-validation
    Cv {
        /// Input data file (CSV with a header row)
        #[arg(long)]
        data: PathBuf,

        /// 0-based column index of the label
        #[arg(long)]
        label: i64,

        /// Number of folds
        #[arg(long, default_value_t = 5)]
        folds: usize,

        #[command(flatten)]
        flags: TrainingFlags,
    },
}

fn cmd_train(data: &PathBuf, label: i64, out: &PathBuf, flags: &TrainingFlags) -> Result<(), HistBoostError> {
    if label < 0 {
        return Err(HistBoostError::InvalidConfiguration(
            "label".to_string(),
            "a non-negative column index".to_string(),
            label.to_string(),
        ));
    }
    info!("loading data from {}", data.display());
    let matrix = DataMatrix::from_csv(data, label)?;
    info!("loaded {} rows and {} columns", matrix.n_rows(), matrix.n_cols());

    let mut model = GradientBooster::new(flags.to_config()?)?;
    model.fit(&matrix)?;

    model.save_booster(out)?;
    info!("model saved to {}", out.display());
    Ok(())
}

fn cmd_predict(data: &PathBuf, model_path: &PathBuf, label: i64, out: Option<&PathBuf>) -> Result<(), HistBoostError> {
    let model = GradientBooster::load_booster(model_path)?;
    let matrix = DataMatrix::from_csv(data, label)?;
    let preds = model.predict(&matrix)?;

    let mut body = String::with_capacity(preds.len() * 12);
    for p in &preds {
        body.push_str(&p.to_string());
        body.push('\n');
    }
    match out {
        Some(path) => {
            fs::write(path, body).map_err(|e| HistBoostError::IoError(path.display().to_string(), e.to_string()))?;
            info!("wrote {} predictions to {}", preds.len(), path.display());
        }
        None => print!("{}", body),
    }
    Ok(())
}

fn cmd_cv(data: &PathBuf, label: i64, folds: usize, flags: &TrainingFlags) -> Result<(), HistBoostError> {
    if label < 0 {
        return Err(HistBoostError::InvalidConfiguration(
            "label".to_string(),
            "a non-negative column index".to_string(),
            label.to_string(),
        ));
    }
    let matrix = DataMatrix::from_csv(data, label)?;
    let config = flags.to_config()?;
    let metric = config.metric;
    let model = GradientBooster::new(config)?;
    let results = model.cv(&matrix, folds)?;

    println!("Cross-validation results ({} folds):", folds);
    for (round, value) in results.iter().enumerate() {
        println!("round {}: {} = {}", round, metric, value);
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), HistBoostError> {
    match &cli.command {
        Commands::Train { data, label, out, flags } => cmd_train(data, *label, out, flags),
        Commands::Predict { data, model, label, out } => cmd_predict(data, model, *label, out.as_ref()),
        Commands::Cv { data, label, folds, flags } => cmd_cv(data, *label, *folds, flags),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    // Help and version print to stdout and exit 0; every real error, usage
    // errors included, exits 1.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
