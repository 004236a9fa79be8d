//! Evaluate command

use anyhow::{Context, Result};
use console::style;
use issue_classifier::{ClassifierConfig, IssueDataset, MulticlassMetrics, TrainedModel};
use std::path::Path;

pub fn run(
    config: &ClassifierConfig,
    model: &Path,
    test: &Path,
    top_k: Option<usize>,
    json: bool,
) -> Result<()> {
    if top_k == Some(0) {
        anyhow::bail!("--top-k must be at least 1");
    }
    let trained = TrainedModel::load(model)
        .with_context(|| format!("Failed to load model from {}", model.display()))?;
    let data = IssueDataset::load(test)
        .with_context(|| format!("Failed to load test data from {}", test.display()))?;

    let metrics = trained
        .evaluate(&data, top_k.or(config.evaluation.top_k))
        .context("Evaluation failed")?;
    print_metrics(&metrics, json)
}

pub(super) fn print_metrics(metrics: &MulticlassMetrics, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(metrics)?);
        return Ok(());
    }

    println!("\n{}", style("Model quality metrics").bold());
    println!("{}", style("──────────────────────────────────────").dim());
    println!("  MicroAccuracy:    {:.3}", metrics.micro_accuracy);
    println!("  MacroAccuracy:    {:.3}", metrics.macro_accuracy);
    println!("  LogLoss:          {:.3}", metrics.log_loss);
    println!("  LogLossReduction: {:.3}", metrics.log_loss_reduction);
    if let (Some(k), Some(acc)) = (metrics.top_k, metrics.top_k_accuracy) {
        println!("  Top-{k} accuracy:   {acc:.3}");
    }
    println!(
        "  {} rows evaluated{}",
        style(metrics.evaluated_rows).cyan(),
        if metrics.skipped_rows > 0 {
            format!(", {} skipped", style(metrics.skipped_rows).yellow())
        } else {
            String::new()
        }
    );

    let matrix = &metrics.confusion_matrix;
    println!("\n  {:<28} {:>9} {:>9}", "Area", "Precision", "Recall");
    for (i, name) in matrix.class_names.iter().enumerate() {
        println!(
            "  {:<28} {:>9} {:>9}",
            name,
            format_ratio(matrix.precision(i)),
            format_ratio(matrix.recall(i))
        );
    }
    println!();
    Ok(())
}

fn format_ratio(value: f64) -> String {
    if value.is_nan() {
        "-".to_string()
    } else {
        format!("{value:.3}")
    }
}
