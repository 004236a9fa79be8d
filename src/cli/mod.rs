//! CLI command definitions and handlers

mod evaluate;
mod predict;
mod train;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use issue_classifier::{load_config, ClassifierConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Predict the area label of a GitHub issue from its title and description
#[derive(Parser, Debug)]
#[command(name = "issue-classifier")]
#[command(
    version,
    after_help = "\
Examples:
  issue-classifier train --train data/issues_train.tsv --test data/issues_test.tsv
  issue-classifier evaluate --model issues.model --test data/issues_test.tsv --json
  issue-classifier predict --model issues.model --title \"DataTable not updated\" --description \"...\""
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Config file (default: ./issue-classifier.toml, then the user config)
    #[arg(long, global = true, env = "ISSUE_CLASSIFIER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a model and save it
    Train {
        /// Training data (tab-separated, with Title/Description/Area columns)
        #[arg(long)]
        train: PathBuf,

        /// Test data to evaluate on after training
        #[arg(long)]
        test: Option<PathBuf>,

        /// Where to write the model
        #[arg(long, short = 'm', default_value = "issues.model")]
        model: PathBuf,

        /// Print metrics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluate a saved model against labeled data
    Evaluate {
        #[arg(long, short = 'm', default_value = "issues.model")]
        model: PathBuf,

        #[arg(long)]
        test: PathBuf,

        /// Also report top-k accuracy
        #[arg(long)]
        top_k: Option<usize>,

        #[arg(long)]
        json: bool,
    },

    /// Predict the area of a single issue
    Predict {
        #[arg(long, short = 'm', default_value = "issues.model")]
        model: PathBuf,

        #[arg(long, short = 't', default_value = "")]
        title: String,

        #[arg(long, short = 'd', default_value = "")]
        description: String,

        /// Print the prediction with per-area scores as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Train {
            train,
            test,
            model,
            json,
        } => train::run(config, &train, test.as_deref(), &model, json),
        Commands::Evaluate {
            model,
            test,
            top_k,
            json,
        } => evaluate::run(&config, &model, &test, top_k, json),
        Commands::Predict {
            model,
            title,
            description,
            json,
        } => predict::run(&model, &title, &description, json),
    }
}

/// An explicit `--config` must load; otherwise fall back to discovery
fn resolve_config(explicit: Option<&Path>) -> Result<ClassifierConfig> {
    match explicit {
        Some(path) => ClassifierConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => {
            let cwd = std::env::current_dir().context("Cannot read current directory")?;
            Ok(load_config(&cwd))
        }
    }
}

fn spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} {msg}")
    {
        spinner.set_style(style);
    }
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
