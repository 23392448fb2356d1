//! Offline entry points for the barter matching engine.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;

use barter_match::config::EngineConfig;
use barter_match::diagnostics::{ConsistencyCase, Diagnostics, DiagnosticsConfig};
use barter_match::features::MatchingStore;
use barter_match::feedback::{FeedbackAction, FeedbackLog, FeedbackManager};
use barter_match::model::{ArtifactStore, ClassifierKind};
use barter_match::scoring::{HybridMatcher, MatchRequest};
use barter_match::training::{ModelTrainer, TrainerConfig, TuneMetric, TunerConfig};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Hybrid rule/ML/semantic matching for barter want/offer pairs.
#[derive(Parser, Debug)]
#[command(name = "barter-match")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Print results as pretty JSON.
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score one pair.
    Score {
        text1: String,
        text2: String,
        #[arg(long, default_value = "")]
        category1: String,
        #[arg(long, default_value = "")]
        category2: String,
        #[arg(long)]
        base_score: Option<f64>,
        /// Append the evaluated pair to the record store.
        #[arg(long)]
        record: bool,
    },

    /// Log user feedback for a stored pair.
    Feedback {
        pair_id: String,
        #[arg(long)]
        user_id: String,
        /// confirmed, rejected or ignored.
        #[arg(long)]
        action: FeedbackAction,
        #[arg(long)]
        is_match: bool,
        #[arg(long)]
        prediction_score: f64,
    },

    /// Replay the feedback log into the store and optionally retrain.
    Commit {
        #[arg(long)]
        auto_retrain: bool,
    },

    /// Train a new model version from labeled records.
    Train {
        /// logistic or svm.
        #[arg(long, default_value = "logistic")]
        classifier: ClassifierKind,
        /// Metric for threshold tuning: f1, precision, recall or balanced_f1.
        #[arg(long, default_value = "f1")]
        metric: TuneMetric,
        #[arg(long)]
        categories: bool,
        #[arg(long)]
        semantic: bool,
        #[arg(long)]
        no_tune: bool,
    },

    /// Feedback counts and online metrics.
    Stats {
        #[arg(long, default_value_t = 7)]
        days: i64,
    },

    /// Labeled pairs whose rule and semantic scores disagree.
    Outliers {
        #[arg(long, default_value_t = 0.3)]
        divergence_threshold: f64,
        #[arg(long, default_value_t = 10)]
        min_samples: usize,
    },

    /// Run curated or supplied pairs through every scorer.
    Validate {
        /// JSON list of cases; built-in cases when omitted.
        #[arg(long)]
        cases: Option<PathBuf>,
    },

    /// Full diagnostic report.
    Report {
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long, default_value_t = 0.3)]
        divergence_threshold: f64,
        #[arg(long, default_value_t = 10)]
        min_samples: usize,
    },

    /// Export high-divergence unlabeled pairs for manual labeling.
    Candidates {
        #[arg(long)]
        output: PathBuf,
        #[arg(long, default_value_t = 0.3)]
        min_divergence: f64,
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },

    /// Export all records as CSV.
    ExportCsv {
        #[arg(long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = EngineConfig::from_env()?;
    config.validate()?;

    tracing::info!(
        data_dir = %config.data_dir.display(),
        records = %config.records_path.display(),
        model_dir = %config.model_dir.display(),
        "barter-match starting"
    );

    match args.command {
        Command::Score {
            text1,
            text2,
            category1,
            category2,
            base_score,
            record,
        } => {
            let matcher = Arc::new(HybridMatcher::from_config(&config)?);
            let mut request = MatchRequest::new(text1, text2, category1, category2);
            if let Some(base) = base_score {
                request = request.with_base_score(base);
            }

            let outcome = if record {
                let mut store = MatchingStore::open(&config.records_path)?;
                matcher.record_pair(&mut store, &request)?
            } else {
                matcher.evaluate_blocking_offload(request).await?
            };
            print_json(&outcome, args.pretty)?;
        }

        Command::Feedback {
            pair_id,
            user_id,
            action,
            is_match,
            prediction_score,
        } => {
            let mut store = MatchingStore::open(&config.records_path)?;
            let mut manager = feedback_manager(&config)?;
            let entry = manager.log_feedback(
                &mut store,
                &pair_id,
                &user_id,
                is_match,
                prediction_score,
                action,
                BTreeMap::new(),
            )?;
            print_json(&entry, args.pretty)?;
        }

        Command::Commit { auto_retrain } => {
            let mut store = MatchingStore::open(&config.records_path)?;
            let manager = feedback_manager(&config)?;
            let trainer = trainer(&config, TrainerConfig::default());
            let report = manager.commit_to_training(&mut store, auto_retrain, &trainer)?;
            print_json(&report, args.pretty)?;
        }

        Command::Train {
            classifier,
            metric,
            categories,
            semantic,
            no_tune,
        } => {
            let store = MatchingStore::open(&config.records_path)?;
            let trainer_config = TrainerConfig {
                tuner: TunerConfig::default().with_metric(metric),
                ..TrainerConfig::default()
            }
            .with_classifier(classifier)
            .with_categories(categories)
            .with_semantic(semantic)
            .with_threshold_tuning(!no_tune);

            let outcome = trainer(&config, trainer_config).run(&store)?;
            tracing::info!(version = %outcome.artifact.version, "Model saved");
            print_json(&outcome.report, args.pretty)?;
        }

        Command::Stats { days } => {
            let manager = feedback_manager(&config)?;
            let store = MatchingStore::open(&config.records_path)?;
            let summary = serde_json::json!({
                "store": store.statistics(),
                "feedback": manager.feedback_stats(days),
                "runtime": manager.runtime_metrics(),
                "should_retrain": manager.should_retrain(&store, config.min_new_feedback),
            });
            print_json(&summary, args.pretty)?;
        }

        Command::Outliers {
            divergence_threshold,
            min_samples,
        } => {
            let store = MatchingStore::open(&config.records_path)?;
            let outliers =
                diagnostics(&config)?.detect_outliers(&store, divergence_threshold, min_samples);
            print_json(&outliers, args.pretty)?;
        }

        Command::Validate { cases } => {
            let cases: Option<Vec<ConsistencyCase>> = match cases {
                Some(path) => {
                    let raw = fs::read_to_string(&path)
                        .with_context(|| format!("reading cases from {}", path.display()))?;
                    Some(serde_json::from_str(&raw)?)
                }
                None => None,
            };
            let report = diagnostics(&config)?.validate_consistency(cases.as_deref());
            print_json(&report, args.pretty)?;
        }

        Command::Report {
            output,
            divergence_threshold,
            min_samples,
        } => {
            let store = MatchingStore::open(&config.records_path)?;
            let diag_config = DiagnosticsConfig::default()
                .with_divergence_threshold(divergence_threshold)
                .with_min_samples(min_samples);
            let report = diagnostics(&config)?.comprehensive_report(&store, &diag_config);
            match output {
                Some(path) => {
                    Diagnostics::save_report(&report, &path)?;
                    tracing::info!(path = %path.display(), "Report written");
                }
                None => print_json(&report, args.pretty)?,
            }
        }

        Command::Candidates {
            output,
            min_divergence,
            limit,
        } => {
            let store = MatchingStore::open(&config.records_path)?;
            let written = diagnostics(&config)?.export_training_candidates(
                &store,
                &output,
                min_divergence,
                limit,
            )?;
            println!("{written}");
        }

        Command::ExportCsv { output } => {
            let store = MatchingStore::open(&config.records_path)?;
            let rows = store.export_csv(&output)?;
            println!("{rows}");
        }
    }

    Ok(())
}

fn feedback_manager(config: &EngineConfig) -> anyhow::Result<FeedbackManager> {
    let log = FeedbackLog::open(&config.feedback_path)?;
    Ok(FeedbackManager::new(log, config.min_new_feedback))
}

fn trainer(config: &EngineConfig, trainer_config: TrainerConfig) -> ModelTrainer {
    let trainer_config = trainer_config.with_min_samples(config.min_training_samples);
    ModelTrainer::new(trainer_config, ArtifactStore::new(&config.model_dir))
}

fn diagnostics(config: &EngineConfig) -> anyhow::Result<Diagnostics> {
    Ok(Diagnostics::new(Arc::new(HybridMatcher::from_config(config)?)))
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}
