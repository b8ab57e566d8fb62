//! rbf-insight CLI module
//!
//! Command-line interface for training, evaluating, explaining and
//! cross-validating RBF classifiers on CSV data.

use clap::{Parser, Subcommand};
use colored::*;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::explainability::GlobalImportance;
use crate::export::{LocalStore, ModelStore};
use crate::inference::RbfClassifier;
use crate::training::{
    sweep_thresholds, ClassificationMetrics, CrossValidator, GridSearchConfig,
    NormalizationScope, RegressionMetrics, TrainerConfig,
};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString    { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn kv(key: &str, val: &str) {
    println!("  {:<16} {}", muted(key), val.white());
}

/// Horizontal bar scaled against `max`, for attribution tables.
fn bar(value: f64, max: f64) -> String {
    let width = if max > 0.0 { (value.abs() / max * 24.0).round() as usize } else { 0 };
    "█".repeat(width)
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "rbf-insight")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "RBF network classifier with exact Shapley explanations")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train a classifier and save it to the model store
    Train {
        /// Input CSV file with a header row
        #[arg(short, long)]
        data: PathBuf,

        /// Target column name (0/1 labels)
        #[arg(short, long)]
        target: String,

        /// Name to save the model under
        #[arg(short, long, default_value = "FoodClassifier_V1")]
        name: String,

        /// Model store directory
        #[arg(long, default_value = "models")]
        store: PathBuf,

        /// JSON trainer config; flags below override it
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of hidden RBF units
        #[arg(long)]
        hidden: Option<usize>,

        /// Training epochs
        #[arg(long)]
        epochs: Option<usize>,

        /// Initial learning rate
        #[arg(long)]
        lr: Option<f64>,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Score a labelled CSV with a stored model
    Evaluate {
        #[arg(short, long)]
        data: PathBuf,

        #[arg(short, long)]
        target: String,

        #[arg(short, long, default_value = "FoodClassifier_V1")]
        name: String,

        #[arg(long, default_value = "models")]
        store: PathBuf,

        /// Decision threshold
        #[arg(long, default_value = "0.5")]
        threshold: f64,

        /// Search thresholds 0.05..0.90 for the best accuracy
        #[arg(long)]
        sweep: bool,
    },

    /// Exact Shapley values for one row
    Explain {
        #[arg(short, long)]
        data: PathBuf,

        /// Column to ignore if present
        #[arg(short, long)]
        target: Option<String>,

        #[arg(short, long, default_value = "FoodClassifier_V1")]
        name: String,

        #[arg(long, default_value = "models")]
        store: PathBuf,

        /// Zero-based row index
        #[arg(short, long, default_value = "0")]
        row: usize,
    },

    /// Global feature importance over a dataset
    Importance {
        #[arg(short, long)]
        data: PathBuf,

        #[arg(short, long)]
        target: Option<String>,

        #[arg(short, long, default_value = "FoodClassifier_V1")]
        name: String,

        #[arg(long, default_value = "models")]
        store: PathBuf,

        /// Use one-at-a-time value replacement instead of exact Shapley
        #[arg(long)]
        replacement: bool,
    },

    /// K-fold grid search over hidden-neuron counts
    Cv {
        #[arg(short, long)]
        data: PathBuf,

        #[arg(short, long)]
        target: String,

        /// JSON grid-search config; flags below override it
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(short, long)]
        folds: Option<usize>,

        #[arg(long)]
        start: Option<usize>,

        #[arg(long)]
        end: Option<usize>,

        #[arg(long)]
        step: Option<usize>,

        #[arg(long)]
        epochs: Option<usize>,

        #[arg(long)]
        lr: Option<f64>,

        #[arg(long)]
        seed: Option<u64>,

        /// Fit normalization on each fold's training rows only
        #[arg(long)]
        per_fold: bool,

        /// Run folds one after another
        #[arg(long)]
        sequential: bool,
    },
}

// ─── Data loading ──────────────────────────────────────────────────────────────

/// Features and (optional) labels read from a CSV file
pub struct Dataset {
    pub feature_names: Vec<String>,
    pub features: Array2<f64>,
    pub targets: Option<Array1<f64>>,
}

pub fn load_data(path: &Path) -> anyhow::Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_infer_schema_length(Some(1000))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

fn numeric_column(df: &DataFrame, name: &str) -> anyhow::Result<Vec<f64>> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    series
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            v.ok_or_else(|| anyhow::anyhow!("column '{}' has no numeric value at row {}", name, i))
        })
        .collect()
}

/// Every column except `target` becomes a feature, in file order.
pub fn load_dataset(path: &Path, target: Option<&str>) -> anyhow::Result<Dataset> {
    let df = load_data(path)?;

    let feature_names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .filter(|name| Some(name.as_str()) != target)
        .collect();
    if feature_names.is_empty() {
        anyhow::bail!("{} has no feature columns", path.display());
    }

    let columns = feature_names
        .iter()
        .map(|name| numeric_column(&df, name))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let features = Array2::from_shape_fn((df.height(), columns.len()), |(r, c)| columns[c][r]);

    let targets = match target {
        Some(name) if df.get_column_names().iter().any(|c| c.as_str() == name) => {
            Some(Array1::from_vec(numeric_column(&df, name)?))
        }
        _ => None,
    };

    Ok(Dataset {
        feature_names,
        features,
        targets,
    })
}

fn require_targets(dataset: &Dataset, target: &str) -> anyhow::Result<Array1<f64>> {
    dataset
        .targets
        .clone()
        .ok_or_else(|| anyhow::anyhow!("target column '{}' not found", target))
}

fn load_model(store_dir: &Path, name: &str) -> anyhow::Result<RbfClassifier> {
    let store = LocalStore::open(store_dir)?;
    Ok(store.load(name)?)
}

// ─── Commands ──────────────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
pub fn cmd_train(
    data_path: &Path,
    target: &str,
    name: &str,
    store_dir: &Path,
    config_path: Option<&Path>,
    hidden: Option<usize>,
    epochs: Option<usize>,
    lr: Option<f64>,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    section("Train");

    let mut config = match config_path {
        Some(path) => TrainerConfig::from_json_file(path)?,
        None => TrainerConfig::default(),
    };
    if let Some(h) = hidden {
        config = config.with_hidden_neurons(h);
    }
    if let Some(e) = epochs {
        config = config.with_epochs(e);
    }
    if let Some(lr) = lr {
        config = config.with_learning_rate(lr);
    }
    if let Some(s) = seed {
        config = config.with_seed(s);
    }
    config.validate()?;

    step_run("Loading data");
    let start = Instant::now();
    let dataset = load_dataset(data_path, Some(target))?;
    let y = require_targets(&dataset, target)?;
    step_done(&format!(
        "{} rows × {} features in {:?}",
        dataset.features.nrows(),
        dataset.features.ncols(),
        start.elapsed()
    ));

    step_run(&format!("Training {} hidden units", config.hidden_neurons.to_string().cyan()));
    let start = Instant::now();
    let model = RbfClassifier::fit(&dataset.features, &y, config)?;
    step_done(&format!("{:?}", start.elapsed()));

    let scores = model.predict_batch(&dataset.features)?;
    let metrics = ClassificationMetrics::evaluate(&scores.to_vec(), &y.to_vec(), 0.5)?;

    let store = LocalStore::open(store_dir)?;
    let record = store.save(name, &model)?;
    step_ok(&format!("Saved {} ({})", name.cyan(), record.created_at.to_rfc3339()));

    println!();
    kv("Train accuracy", &format!("{:.2}%", metrics.accuracy * 100.0));
    kv("Train AUC", &format!("{:.4}", metrics.auc));
    println!();
    Ok(())
}

pub fn cmd_evaluate(
    data_path: &Path,
    target: &str,
    name: &str,
    store_dir: &Path,
    threshold: f64,
    sweep: bool,
) -> anyhow::Result<()> {
    section("Evaluate");

    let model = load_model(store_dir, name)?;
    let dataset = load_dataset(data_path, Some(target))?;
    let y = require_targets(&dataset, target)?.to_vec();
    let scores = model.predict_batch(&dataset.features)?.to_vec();

    let (threshold, metrics) = if sweep {
        let best = sweep_thresholds(&scores, &y)?;
        (best.threshold, best.metrics)
    } else {
        (threshold, ClassificationMetrics::evaluate(&scores, &y, threshold)?)
    };
    let regression = RegressionMetrics::compute(&scores, &y)?;

    kv("Model", name);
    kv("Rows", &dataset.features.nrows().to_string());
    kv("Threshold", &format!("{:.2}", threshold));
    println!();
    for line in metrics.to_string().lines().chain(regression.to_string().lines()) {
        println!("  {}", line);
    }
    println!();
    Ok(())
}

pub fn cmd_explain(
    data_path: &Path,
    target: Option<&str>,
    name: &str,
    store_dir: &Path,
    row: usize,
) -> anyhow::Result<()> {
    section("Explain");

    let model = load_model(store_dir, name)?;
    let dataset = load_dataset(data_path, target)?;
    if row >= dataset.features.nrows() {
        anyhow::bail!("row {} out of range ({} rows)", row, dataset.features.nrows());
    }

    let explainer = model.explainer()?;
    let explanation = explainer.explain_instance(&dataset.features.row(row))?;

    kv("Base value", &format!("{:.4}", explanation.base_value));
    kv("Prediction", &format!("{:.4}", explanation.prediction));
    println!();

    let max = explanation.values.iter().fold(0.0f64, |m, v| m.max(v.abs()));
    for (i, value) in explanation.ranked() {
        let label = format!("{:<20}", dataset.feature_names[i]);
        let bar = bar(value, max);
        let bar = if value >= 0.0 { bar.green() } else { bar.red() };
        println!("  {} {:>+9.4} {}", muted(&label), value, bar);
    }
    println!();
    Ok(())
}

pub fn cmd_importance(
    data_path: &Path,
    target: Option<&str>,
    name: &str,
    store_dir: &Path,
    replacement: bool,
) -> anyhow::Result<()> {
    section("Global importance");

    let model = load_model(store_dir, name)?;
    let dataset = load_dataset(data_path, target)?;
    let explainer = model.explainer()?;

    step_run(&format!("Explaining {} rows", dataset.features.nrows()));
    let start = Instant::now();
    let importance: GlobalImportance = if replacement {
        explainer.replacement_importance(&dataset.features)?
    } else {
        explainer.explain_global(&dataset.features)?
    };
    step_done(&format!("{:?}", start.elapsed()));
    println!();

    let max = importance.mean_abs.iter().fold(0.0f64, |m, v| m.max(*v));
    for (i, value) in importance.ranked() {
        let label = format!("{:<20}", dataset.feature_names[i]);
        println!("  {} {:>9.4} {}", muted(&label), value, bar(value, max).cyan());
    }
    println!();
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_cv(
    data_path: &Path,
    target: &str,
    config_path: Option<&Path>,
    folds: Option<usize>,
    start_neurons: Option<usize>,
    end_neurons: Option<usize>,
    step: Option<usize>,
    epochs: Option<usize>,
    lr: Option<f64>,
    seed: Option<u64>,
    per_fold: bool,
    sequential: bool,
) -> anyhow::Result<()> {
    section("Cross-validation");

    let mut config = match config_path {
        Some(path) => GridSearchConfig::from_json_file(path)?,
        None => GridSearchConfig::default(),
    };
    config.k_folds = folds.unwrap_or(config.k_folds);
    config.start_neurons = start_neurons.unwrap_or(config.start_neurons);
    config.end_neurons = end_neurons.unwrap_or(config.end_neurons);
    config.step = step.unwrap_or(config.step);
    config.epochs = epochs.unwrap_or(config.epochs);
    config.learning_rate = lr.unwrap_or(config.learning_rate);
    config.seed = seed.unwrap_or(config.seed);
    if per_fold {
        config.normalization = NormalizationScope::PerFold;
    }
    if sequential {
        config.parallel = false;
    }
    config.validate()?;

    let dataset = load_dataset(data_path, Some(target))?;
    let y = require_targets(&dataset, target)?;

    step_run(&format!(
        "{} folds × {} configurations",
        config.k_folds,
        config.neuron_counts().len()
    ));
    let start = Instant::now();
    let report = CrossValidator::new(config).grid_search(&dataset.features, &y)?;
    step_done(&format!("{:?}", start.elapsed()));
    println!();

    println!(
        "  {}",
        muted(&format!(
            "{:>7}  {:>17}  {:>17}  {:>17}  {:>17}  {:>17}",
            "hidden", "accuracy", "precision", "recall", "f1", "auc"
        ))
    );
    for summary in &report.configurations {
        let row = format!(
            "{:>7}  {:>17}  {:>17}  {:>17}  {:>17}  {:>17}",
            summary.hidden_neurons,
            summary.accuracy.to_string(),
            summary.precision.to_string(),
            summary.recall.to_string(),
            summary.f1.to_string(),
            summary.auc.to_string()
        );
        if Some(summary.hidden_neurons) == report.best {
            println!("  {}", row.green().bold());
        } else {
            println!("  {}", row);
        }
    }

    println!();
    match report.best_configuration() {
        Some(best) => step_ok(&format!(
            "Best: {} hidden units, accuracy {}",
            best.hidden_neurons.to_string().cyan(),
            best.accuracy
        )),
        None => println!("  {}", "No configuration scored above zero".yellow()),
    }
    println!();
    Ok(())
}
