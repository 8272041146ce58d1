//! TrustNet CLI: serve the evaluation API, score single answers, and run
//! offline evaluation over labeled datasets.

mod commands;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// TrustNet: groundedness scoring for generated answers
#[derive(Parser, Debug)]
#[command(name = "trustnet", version, about, long_about = None)]
struct Cli {
    /// Workspace directory (looked up for `.trustnet/config.toml`)
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Question, context and answer to score.
#[derive(clap::Args, Debug)]
struct Triple {
    /// The question that was asked
    #[arg(long)]
    question: String,
    /// Context the answer should be grounded in
    #[arg(long)]
    context: String,
    /// The generated answer
    #[arg(long)]
    answer: String,
}

/// Labeled input for the offline commands.
#[derive(clap::Args, Debug)]
struct DatasetArgs {
    /// JSONL dataset of {question, context, answer, label}
    dataset: PathBuf,
    /// Treat the input as extracted features ({features, label}) instead
    #[arg(long)]
    features: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Override the bind host
        #[arg(long)]
        host: Option<String>,
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Score one answer and print the result as JSON
    Evaluate(Triple),
    /// Print the signal values for one answer
    Signals(Triple),
    /// Extract features for a dataset and write them as JSONL
    Features {
        dataset: PathBuf,
        /// Output file
        #[arg(short, long, default_value = "data/features.jsonl")]
        output: PathBuf,
    },
    /// Evaluate the configured classifier on a labeled dataset
    Eval {
        #[command(flatten)]
        input: DatasetArgs,
        /// Write the report here as well as to stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Zero each feature in turn and report the accuracy lost
    Ablation {
        #[command(flatten)]
        input: DatasetArgs,
    },
    /// Score the random and similarity-only baselines
    Baseline {
        #[command(flatten)]
        input: DatasetArgs,
        /// Seed for the random baseline
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Shuffle a dataset into train/val/test splits (70/15/15)
    Split {
        dataset: PathBuf,
        /// Directory for train.jsonl, val.jsonl and test.jsonl
        #[arg(short, long, default_value = "data/splits")]
        output_dir: PathBuf,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Show the effective configuration as TOML
    Show,
    /// Write a default configuration to .trustnet/config.toml
    Init,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("ai", "trustnet", "trustnet")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "trustnet.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    commands::handle_command(cli.command, &workspace, cli.config.as_deref()).await
}
