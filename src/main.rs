use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{info, warn};

use lendguard_anomaly::{
    AnomalyDetector, AnomalyInput, NORMALIZED_DIMENSIONS, ScreenInput, TransactionScreen,
};
use lendguard_forecast::{
    ChurnFactors, LoanDefaultFactors, forecast_market_trend, forecast_time_series, predict_churn,
    predict_loan_default,
};
use lendguard_io::{
    DatasetReader, ExperimentName, ResultWriter, SnapshotStore, TrainingReport, read_json,
    read_lines,
};
use lendguard_risk::{
    CreditProfile, CreditScorer, ENSEMBLE_FEATURES, EnsembleInput, EnsemblePrediction,
    FeatureImportance, LoanPosition, RiskEnsemble, assess_loan,
};
use lendguard_train::{
    Hyperparameter, HyperparameterGrid, ModelTrainingConfig, Regularization, Trainer,
    TrainingSummary,
};

/// Snapshot label for a serialized [`RiskEnsemble`].
const RISK_SNAPSHOT_KIND: &str = "risk_ensemble";

#[derive(Parser)]
#[command(name = "lendguard")]
#[command(about = "Risk intelligence for lending: anomaly detection, credit risk and forecasting")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Optimizer settings for the `train` subcommand.
#[derive(Args, Debug, Clone)]
struct TrainingArgs {
    /// Passes over the training partition
    #[arg(long, default_value_t = 100)]
    epochs: usize,

    /// Samples per gradient step
    #[arg(long, default_value_t = 32)]
    batch_size: usize,

    /// Trailing fraction of the data held out for validation, in [0, 1)
    #[arg(long, default_value_t = 0.2)]
    validation_split: f64,

    /// Gradient descent step size
    #[arg(long, default_value_t = 0.01)]
    learning_rate: f64,

    /// Weight penalty: "none", "l1" or "l2"
    #[arg(long, default_value = "none")]
    regularization: String,
}

#[derive(Subcommand)]
enum Command {
    /// Score one transaction for fraud and anomalies
    Anomaly {
        /// Path to the transaction JSON file
        #[arg(long)]
        input: PathBuf,

        /// CSV of normalized past transactions (9 numeric columns) to fit the forest and LOF
        #[arg(long)]
        history: Option<PathBuf>,
    },

    /// Screen one transfer against fixed fraud rules
    Screen {
        /// Path to the transfer JSON file
        #[arg(long)]
        input: PathBuf,

        /// Text file of blacklisted wallet addresses, one per line
        #[arg(long)]
        blacklist: Option<PathBuf>,
    },

    /// Blend the four risk regressors into a risk score and action
    Risk {
        /// Path to the borrower JSON file
        #[arg(long)]
        input: PathBuf,

        /// CSV of normalized features (10 columns) plus a trailing risk target
        #[arg(long)]
        training: Option<PathBuf>,

        /// Snapshot file: loaded when present and no training data is given, saved after training
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Number of trees in the random forest member
        #[arg(long, default_value_t = 50)]
        n_trees: usize,

        /// Cross-validate the neural network member on the training data with this many folds
        #[arg(long)]
        cv_folds: Option<usize>,

        /// Include per-feature importances from the random forest
        #[arg(long, default_value_t = false)]
        explain: bool,
    },

    /// Forecast a time series with the autoregressive and Holt models
    Forecast {
        /// CSV file holding the series
        #[arg(long)]
        series: PathBuf,

        /// Column to read
        #[arg(long, default_value = "value")]
        column: String,

        /// Steps ahead to forecast
        #[arg(long, default_value_t = 7)]
        horizon: usize,
    },

    /// Forecast price direction and volume volatility
    Market {
        /// CSV file holding price and volume columns
        #[arg(long)]
        series: PathBuf,

        #[arg(long, default_value = "price")]
        price_column: String,

        #[arg(long, default_value = "volume")]
        volume_column: String,

        /// Steps ahead to forecast
        #[arg(long, default_value_t = 7)]
        horizon: usize,
    },

    /// Estimate a borrower's probability of default
    Default {
        /// Payment history score in [0, 100]
        #[arg(long)]
        payment_history: f64,

        /// Number of past delinquencies
        #[arg(long)]
        delinquency_count: u32,

        /// Outstanding balance over limit, in [0, 1]
        #[arg(long)]
        utilization_ratio: f64,

        /// Income stability score in [0, 100]
        #[arg(long)]
        income_stability: f64,

        #[arg(long)]
        account_age_months: f64,
    },

    /// Estimate the probability that a user stops transacting
    Churn {
        #[arg(long)]
        account_age_months: f64,

        /// Days since the last activity
        #[arg(long)]
        last_activity_days: f64,

        /// Transactions per month
        #[arg(long)]
        transaction_frequency: f64,

        #[arg(long)]
        average_transaction_value: f64,

        #[arg(long, default_value_t = 0)]
        support_tickets: u32,
    },

    /// Compute a 300-850 credit score from a borrower's loan history
    Credit {
        /// Path to the credit profile JSON file
        #[arg(long)]
        profile: PathBuf,
    },

    /// Rate an open loan's default and liquidation risk
    Assess {
        /// Path to the loan position JSON file
        #[arg(long)]
        position: PathBuf,

        /// Credit profile JSON; its score replaces the position's credit score
        #[arg(long)]
        profile: Option<PathBuf>,
    },

    /// Train a logistic classifier on a labelled CSV and write the run history
    Train {
        /// CSV of features with the label in the last column
        #[arg(long)]
        data: PathBuf,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Number of cross-validation folds (skipped if not set)
        #[arg(long)]
        cv_folds: Option<usize>,

        /// Learning rates to grid-search, comma separated
        #[arg(long, value_delimiter = ',')]
        tune_learning_rates: Vec<f64>,

        /// Batch sizes to grid-search, comma separated
        #[arg(long, value_delimiter = ',')]
        tune_batch_sizes: Vec<usize>,

        #[command(flatten)]
        training: TrainingArgs,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct RiskOutput {
    #[serde(flatten)]
    prediction: EnsemblePrediction,
    #[serde(skip_serializing_if = "Option::is_none")]
    cross_validation: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    feature_importance: Option<Vec<FeatureImportance>>,
}

#[derive(Serialize)]
struct TrainOutput {
    experiment: String,
    n_samples: usize,
    n_features: usize,
    summary: Option<TrainingSummary>,
    cv_mean_accuracy: Option<f64>,
    cv_std_accuracy: Option<f64>,
    best_hyperparameters: Option<Vec<Hyperparameter>>,
    artifact: PathBuf,
}

fn parse_regularization(s: &str) -> Result<Regularization> {
    match s {
        "none" => Ok(Regularization::None),
        "l1" => Ok(Regularization::L1),
        "l2" => Ok(Regularization::L2),
        other => anyhow::bail!("unknown regularization: {other} (expected none, l1, or l2)"),
    }
}

fn training_config(args: &TrainingArgs, seed: u64) -> Result<ModelTrainingConfig> {
    Ok(ModelTrainingConfig::new(args.epochs, args.batch_size)?
        .with_validation_split(args.validation_split)?
        .with_learning_rate(args.learning_rate)?
        .with_regularization(parse_regularization(&args.regularization)?)
        .with_seed(seed))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    let mut rng = ChaCha8Rng::seed_from_u64(cli.seed);

    match cli.command {
        Command::Anomaly { input, history } => {
            let transaction: AnomalyInput =
                read_json(&input).context("failed to read transaction JSON")?;

            let mut detector = AnomalyDetector::new();
            if let Some(history) = history {
                let rows = DatasetReader::new(&history)
                    .read_features(NORMALIZED_DIMENSIONS)
                    .context("failed to read history CSV")?;
                detector
                    .train_on_history(rows, &mut rng)
                    .context("failed to fit anomaly detector")?;
            } else {
                warn!("no history given; isolation forest and LOF contribute nothing");
            }

            let score = detector
                .detect(&transaction)
                .context("anomaly detection failed")?;
            print_json(&score)?;
        }

        Command::Screen { input, blacklist } => {
            let transfer: ScreenInput =
                read_json(&input).context("failed to read transfer JSON")?;
            let mut screen = TransactionScreen::new();
            if let Some(blacklist) = blacklist {
                let addresses = read_lines(&blacklist).context("failed to read blacklist")?;
                screen = screen.with_blacklist(&addresses);
                info!(addresses = screen.blacklist_len(), "blacklist loaded");
            }
            let analysis = screen.analyze(&transfer).context("fraud screen failed")?;
            print_json(&analysis)?;
        }

        Command::Risk {
            input,
            training,
            snapshot,
            n_trees,
            cv_folds,
            explain,
        } => {
            let borrower: EnsembleInput =
                read_json(&input).context("failed to read borrower JSON")?;
            let store = snapshot.as_deref().map(SnapshotStore::new);

            let mut cross_validation = None;
            let ensemble = match (training, &store) {
                (None, Some(store)) if store.exists() => {
                    let ensemble: RiskEnsemble = store
                        .load(RISK_SNAPSHOT_KIND)
                        .context("failed to load risk snapshot")?;
                    info!(path = %store.path().display(), "risk ensemble restored");
                    ensemble
                }
                (training, _) => {
                    let mut ensemble = RiskEnsemble::new(&mut rng)?.with_forest_trees(n_trees)?;
                    if let Some(training) = training {
                        let dataset = DatasetReader::new(&training)
                            .read_labelled()
                            .context("failed to read training CSV")?;
                        anyhow::ensure!(
                            dataset.n_features() == ENSEMBLE_FEATURES.len(),
                            "training data has {} feature columns, expected {}",
                            dataset.n_features(),
                            ENSEMBLE_FEATURES.len()
                        );
                        if let Some(folds) = cv_folds {
                            let scores = ensemble
                                .cross_validate(dataset.features(), dataset.targets(), folds, &mut rng)
                                .context("cross-validation failed")?;
                            cross_validation = Some(scores);
                        }
                        ensemble
                            .train(dataset.features(), dataset.targets(), &mut rng)
                            .context("failed to train risk ensemble")?;
                        if let Some(store) = &store {
                            store
                                .save(RISK_SNAPSHOT_KIND, &ensemble)
                                .context("failed to save risk snapshot")?;
                        }
                    } else {
                        warn!("no training data; risk members use their untrained defaults");
                    }
                    ensemble
                }
            };

            let prediction = ensemble
                .predict(&borrower)
                .context("risk prediction failed")?;
            print_json(&RiskOutput {
                prediction,
                cross_validation,
                feature_importance: explain.then(|| ensemble.feature_importance()),
            })?;
        }

        Command::Forecast {
            series,
            column,
            horizon,
        } => {
            let history = DatasetReader::new(&series)
                .read_series(&column)
                .context("failed to read series CSV")?;
            let forecast = forecast_time_series(&history, horizon, &mut rng)
                .context("forecast failed")?;
            print_json(&forecast)?;
        }

        Command::Market {
            series,
            price_column,
            volume_column,
            horizon,
        } => {
            let reader = DatasetReader::new(&series);
            let prices = reader
                .read_series(&price_column)
                .context("failed to read price column")?;
            let volumes = reader
                .read_series(&volume_column)
                .context("failed to read volume column")?;
            let forecast = forecast_market_trend(&prices, &volumes, horizon, &mut rng)
                .context("market forecast failed")?;
            print_json(&forecast)?;
        }

        Command::Default {
            payment_history,
            delinquency_count,
            utilization_ratio,
            income_stability,
            account_age_months,
        } => {
            let prediction = predict_loan_default(&LoanDefaultFactors {
                payment_history,
                delinquency_count,
                utilization_ratio,
                income_stability,
                account_age_months,
            })?;
            print_json(&prediction)?;
        }

        Command::Churn {
            account_age_months,
            last_activity_days,
            transaction_frequency,
            average_transaction_value,
            support_tickets,
        } => {
            let prediction = predict_churn(&ChurnFactors {
                account_age_months,
                last_activity_days,
                transaction_frequency,
                average_transaction_value,
                support_tickets,
            })?;
            print_json(&prediction)?;
        }

        Command::Credit { profile } => {
            let profile: CreditProfile =
                read_json(&profile).context("failed to read credit profile JSON")?;
            let scorer = CreditScorer::new(&mut rng)?;
            let result = scorer.score(&profile).context("credit scoring failed")?;
            print_json(&result)?;
        }

        Command::Assess { position, profile } => {
            let mut position: LoanPosition =
                read_json(&position).context("failed to read loan position JSON")?;
            if let Some(profile) = profile {
                let profile: CreditProfile =
                    read_json(&profile).context("failed to read credit profile JSON")?;
                let credit = CreditScorer::new(&mut rng)?
                    .score(&profile)
                    .context("credit scoring failed")?;
                position.credit_score = Some(credit.score);
            }
            let factors = position.factors().context("invalid loan position")?;
            let assessment = assess_loan(&factors).context("loan assessment failed")?;
            print_json(&assessment)?;
        }

        Command::Train {
            data,
            experiment,
            output_dir,
            cv_folds,
            tune_learning_rates,
            tune_batch_sizes,
            training,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;
            let config = training_config(&training, cli.seed)?;

            // 1. Read dataset
            let dataset = DatasetReader::new(&data)
                .read_labelled()
                .context("failed to read training CSV")?;
            let samples = dataset.to_samples();
            info!(
                n_samples = dataset.n_samples(),
                n_features = dataset.n_features(),
                "dataset loaded"
            );

            // 2. Train on the full dataset
            let mut trainer = Trainer::logistic(dataset.n_features());
            trainer
                .train_model(&samples, &config)
                .context("training failed")?;

            // 3. Optional cross-validation and grid search
            let cv_result = cv_folds
                .map(|k| trainer.cross_validate(&samples, &config, k))
                .transpose()
                .context("cross-validation failed")?;

            let mut grid = HyperparameterGrid::new();
            if !tune_learning_rates.is_empty() {
                grid = grid.with_learning_rates(&tune_learning_rates);
            }
            if !tune_batch_sizes.is_empty() {
                grid = grid.with_batch_sizes(&tune_batch_sizes);
            }
            let tuning = if tune_learning_rates.is_empty() && tune_batch_sizes.is_empty() {
                None
            } else {
                Some(
                    trainer
                        .tune_hyperparameters(&samples, &config, &grid)
                        .context("hyperparameter search failed")?,
                )
            };

            // 4. Write JSON artifact
            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            let artifact = writer.write_training(&TrainingReport {
                feature_names: dataset.feature_names(),
                config: &config,
                history: trainer.history(),
                summary: trainer.summary(),
                cross_validation: cv_result.as_ref(),
                tuning: tuning.as_ref(),
            })?;

            // 5. Print summary
            print_json(&TrainOutput {
                experiment,
                n_samples: dataset.n_samples(),
                n_features: dataset.n_features(),
                summary: trainer.summary(),
                cv_mean_accuracy: cv_result.as_ref().map(|cv| cv.mean_accuracy),
                cv_std_accuracy: cv_result.as_ref().map(|cv| cv.std_deviation),
                best_hyperparameters: tuning.map(|t| t.best_hyperparameters),
                artifact,
            })?;
        }
    }

    Ok(())
}
