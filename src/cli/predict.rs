//! Predict command

use anyhow::{Context, Result};
use console::style;
use issue_classifier::{GitHubIssue, TrainedModel};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct PredictionOutput<'a> {
    predicted_area: &'a str,
    confidence: f32,
    scores: Vec<AreaScore<'a>>,
}

#[derive(Serialize)]
struct AreaScore<'a> {
    area: &'a str,
    score: f32,
}

pub fn run(model: &Path, title: &str, description: &str, json: bool) -> Result<()> {
    let trained = TrainedModel::load(model)
        .with_context(|| format!("Failed to load model from {}", model.display()))?;
    let prediction = trained
        .predict_issue(&GitHubIssue::unlabeled(title, description))
        .context("Prediction failed")?;

    let mut scores: Vec<AreaScore> = trained
        .labels()
        .iter()
        .zip(&prediction.scores)
        .map(|(area, &score)| AreaScore { area, score })
        .collect();
    scores.sort_by(|a, b| b.score.total_cmp(&a.score));

    if json {
        let output = PredictionOutput {
            predicted_area: &prediction.predicted_area,
            confidence: prediction.confidence(),
            scores,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{} {} ({:.1}%)",
        style("Predicted area:").bold(),
        style(&prediction.predicted_area).green().bold(),
        prediction.confidence() * 100.0
    );
    for entry in scores.iter().skip(1).take(2) {
        println!("  {} {:.1}%", style(entry.area).dim(), entry.score * 100.0);
    }
    Ok(())
}
