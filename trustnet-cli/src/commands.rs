//! CLI subcommand handlers.

use crate::{Commands, ConfigAction, DatasetArgs};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use trustnet_core::config::load_config;
use trustnet_core::dataset::{
    AblationReport, ClassificationReport, LabeledFeatures, ablation, evaluate_classifier,
    extract_features, load_dataset, random_baseline, read_jsonl, similarity_only_baseline,
    split_dataset, write_jsonl, write_splits,
};
use trustnet_core::{EvaluationPipeline, FeatureBuilder, TrustNetConfig, load_classifier};

/// Handle a CLI subcommand.
pub async fn handle_command(
    command: Commands,
    workspace: &Path,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    let config =
        || load_config(Some(workspace), config_path).context("Failed to load configuration");

    match command {
        Commands::Serve { host, port } => {
            let mut config = config()?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            let pipeline = EvaluationPipeline::from_config(&config)?;
            trustnet_server::run(&config.server, pipeline)
                .await
                .context("Server failed")
        }
        Commands::Evaluate(t) => {
            let config = config()?;
            let pipeline = EvaluationPipeline::from_config(&config)?;
            let result = pipeline
                .evaluate(&t.question, &t.context, &t.answer)
                .await?;
            print_json(&result)
        }
        Commands::Signals(t) => {
            let config = config()?;
            let pipeline = EvaluationPipeline::from_config(&config)?;
            let signals = pipeline
                .evaluate_signals(&t.question, &t.context, &t.answer)
                .await?;
            print_json(&signals)
        }
        Commands::Features { dataset, output } => {
            let config = config()?;
            let rows = extract_rows(&config, &dataset).await?;
            write_jsonl(&output, &rows)?;
            println!("Wrote {} feature rows to {}", rows.len(), output.display());
            Ok(())
        }
        Commands::Eval { input, output } => {
            let config = config()?;
            let summary = run_eval(&config, &input).await?;
            let json = serde_json::to_string_pretty(&summary)?;
            if let Some(path) = output {
                std::fs::write(&path, &json)
                    .with_context(|| format!("Failed to write report to {}", path.display()))?;
            }
            println!("{json}");
            Ok(())
        }
        Commands::Ablation { input } => {
            let config = config()?;
            let rows = load_rows(&config, &input).await?;
            let classifier = load_classifier(&config.classifier.artifact_path);
            print_ablation(&ablation(classifier.as_ref(), &rows));
            Ok(())
        }
        Commands::Baseline { input, seed } => {
            let config = config()?;
            let rows = load_rows(&config, &input).await?;
            let report = BaselineSummary::compute(&rows, seed);
            print_json(&report)
        }
        Commands::Split {
            dataset,
            output_dir,
            seed,
        } => {
            let samples = load_dataset(&dataset)?;
            let split = split_dataset(samples, seed);
            write_splits(&output_dir, &split)?;
            println!(
                "train: {}  val: {}  test: {}  → {}",
                split.train.len(),
                split.val.len(),
                split.test.len(),
                output_dir.display()
            );
            Ok(())
        }
        Commands::Config {
            action: ConfigAction::Show,
        } => {
            println!("{}", toml::to_string_pretty(&config()?)?);
            Ok(())
        }
        Commands::Config {
            action: ConfigAction::Init,
        } => {
            let path = init_config(workspace)?;
            println!("Configuration at: {}", path.display());
            Ok(())
        }
    }
}

/// Write the default configuration unless one already exists.
fn init_config(workspace: &Path) -> anyhow::Result<PathBuf> {
    let config_dir = workspace.join(".trustnet");
    std::fs::create_dir_all(&config_dir)?;

    let config_path = config_dir.join("config.toml");
    if config_path.exists() {
        tracing::info!(path = %config_path.display(), "Configuration file already exists");
        return Ok(config_path);
    }
    let toml_str = toml::to_string_pretty(&TrustNetConfig::default())?;
    std::fs::write(&config_path, toml_str)?;
    Ok(config_path)
}

async fn extract_rows(
    config: &TrustNetConfig,
    path: &Path,
) -> anyhow::Result<Vec<LabeledFeatures>> {
    let samples = load_dataset(path)?;
    let builder = FeatureBuilder::from_config(config)?;
    tracing::info!(
        samples = samples.len(),
        embedder = builder.embedder_name(),
        extractor = builder.extractor_name(),
        "Extracting features"
    );
    Ok(extract_features(&builder, &samples).await?)
}

async fn load_rows(
    config: &TrustNetConfig,
    input: &DatasetArgs,
) -> anyhow::Result<Vec<LabeledFeatures>> {
    if input.features {
        let rows: Vec<LabeledFeatures> = read_jsonl(&input.dataset)?;
        anyhow::ensure!(!rows.is_empty(), "{} has no rows", input.dataset.display());
        Ok(rows)
    } else {
        extract_rows(config, &input.dataset).await
    }
}

/// Report written by `trustnet eval`.
#[derive(Debug, Serialize)]
struct EvalSummary {
    generated_at: DateTime<Utc>,
    dataset: PathBuf,
    classifier: String,
    #[serde(flatten)]
    report: ClassificationReport,
}

async fn run_eval(config: &TrustNetConfig, input: &DatasetArgs) -> anyhow::Result<EvalSummary> {
    let rows = load_rows(config, input).await?;
    let classifier = load_classifier(&config.classifier.artifact_path);
    let report = evaluate_classifier(classifier.as_ref(), &rows);
    tracing::info!(
        samples = report.samples,
        accuracy = report.accuracy,
        f1 = report.f1,
        "Evaluation complete"
    );
    Ok(EvalSummary {
        generated_at: Utc::now(),
        dataset: input.dataset.clone(),
        classifier: classifier.kind().to_string(),
        report,
    })
}

#[derive(Debug, Serialize)]
struct BaselineSummary {
    random_accuracy: f64,
    seed: u64,
    similarity_only: ClassificationReport,
}

impl BaselineSummary {
    fn compute(rows: &[LabeledFeatures], seed: u64) -> Self {
        let gold: Vec<_> = rows.iter().map(|r| r.label).collect();
        Self {
            random_accuracy: random_baseline(&gold, seed),
            seed,
            similarity_only: similarity_only_baseline(rows),
        }
    }
}

fn print_ablation(report: &AblationReport) {
    println!("base accuracy: {:.4}", report.base_accuracy);
    println!("{:<22} {:>9} {:>8}", "feature", "accuracy", "drop");
    for entry in &report.entries {
        println!(
            "{:<22} {:>9.4} {:>8.4}",
            entry.feature, entry.accuracy, entry.drop
        );
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
