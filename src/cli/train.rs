//! Train command

use super::{evaluate, spinner};
use anyhow::{Context, Result};
use console::style;
use issue_classifier::{ClassifierConfig, Predictor};
use std::path::Path;

pub fn run(
    config: ClassifierConfig,
    train: &Path,
    test: Option<&Path>,
    model: &Path,
    json: bool,
) -> Result<()> {
    let mut predictor = Predictor::with_config(config).context("Invalid configuration")?;

    let rows = predictor
        .load_train_data(train)
        .with_context(|| format!("Failed to load training data from {}", train.display()))?;
    if let Some(test) = test {
        predictor
            .load_test_data(test)
            .with_context(|| format!("Failed to load test data from {}", test.display()))?;
    }

    let progress = spinner(format!("Training on {rows} issues..."));
    let trained = predictor.build_and_train_model();
    progress.finish_and_clear();
    let labels = trained.context("Training failed")?.labels().len();

    if !json {
        println!(
            "{} Trained on {} issues across {} areas",
            style("[OK]").green(),
            style(rows).cyan(),
            style(labels).cyan()
        );
        if let Some(report) = predictor.last_train_report() {
            println!(
                "     {} epochs, final loss {:.4}{}",
                report.epochs,
                report.final_loss,
                if report.skipped > 0 {
                    format!(", {} unlabeled rows skipped", report.skipped)
                } else {
                    String::new()
                }
            );
        }
    }

    if test.is_some() {
        let metrics = predictor.evaluate_model_metrics().context("Evaluation failed")?;
        evaluate::print_metrics(&metrics, json)?;
    }

    predictor
        .save_model(model)
        .with_context(|| format!("Failed to save model to {}", model.display()))?;
    if !json {
        println!("{} Model saved to {}", style("[OK]").green(), style(model.display()).dim());
    }
    Ok(())
}
