//! Multiclass evaluation metrics

use super::model::argmax;
use crate::error::{PredictorError, Result};
use serde::{Deserialize, Serialize};

/// Probabilities are clamped to this before taking the log
const LOG_LOSS_EPSILON: f64 = 1e-15;

/// Counts of actual (rows) vs predicted (columns) classes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub class_names: Vec<String>,
    pub counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    fn new(class_names: &[String]) -> Self {
        let n = class_names.len();
        Self {
            class_names: class_names.to_vec(),
            counts: vec![vec![0; n]; n],
        }
    }

    /// Per-class precision (NaN when the class was never predicted)
    pub fn precision(&self, class: usize) -> f64 {
        let predicted: usize = self.counts.iter().map(|row| row[class]).sum();
        if predicted == 0 {
            f64::NAN
        } else {
            self.counts[class][class] as f64 / predicted as f64
        }
    }

    /// Per-class recall (NaN when the class never occurs)
    pub fn recall(&self, class: usize) -> f64 {
        let actual: usize = self.counts[class].iter().sum();
        if actual == 0 {
            f64::NAN
        } else {
            self.counts[class][class] as f64 / actual as f64
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MulticlassMetrics {
    /// Fraction of rows predicted correctly
    pub micro_accuracy: f64,
    /// Mean per-class accuracy over classes present in the data
    pub macro_accuracy: f64,
    pub log_loss: f64,
    /// Improvement of `log_loss` over predicting the label prior
    pub log_loss_reduction: f64,
    pub top_k: Option<usize>,
    pub top_k_accuracy: Option<f64>,
    /// Mean log-loss per class, NaN for classes absent from the data
    pub per_class_log_loss: Vec<f64>,
    pub confusion_matrix: ConfusionMatrix,
    pub evaluated_rows: usize,
    /// Rows with a missing or unknown label
    pub skipped_rows: usize,
}

/// Score `scores` (class probabilities per row) against `labels`.
///
/// Rows whose label is missing or outside `class_names` are skipped.
pub fn evaluate(
    scores: &[Vec<f32>],
    labels: &[Option<u32>],
    class_names: &[String],
    top_k: Option<usize>,
) -> Result<MulticlassMetrics> {
    if scores.len() != labels.len() {
        return Err(PredictorError::Pipeline(format!(
            "score count ({}) does not match label count ({})",
            scores.len(),
            labels.len()
        )));
    }

    let classes = class_names.len();
    let mut confusion = ConfusionMatrix::new(class_names);
    let mut class_counts = vec![0usize; classes];
    let mut class_loss = vec![0.0f64; classes];
    let mut total_loss = 0.0f64;
    let mut correct = 0usize;
    let mut top_k_hits = 0usize;
    let mut evaluated = 0usize;

    for (row_scores, label) in scores.iter().zip(labels) {
        let Some(actual) = label.map(|l| l as usize).filter(|l| *l < classes) else {
            continue;
        };
        if row_scores.len() != classes {
            return Err(PredictorError::Pipeline(format!(
                "score vector has {} entries, expected {}",
                row_scores.len(),
                classes
            )));
        }

        let Some(predicted) = argmax(row_scores) else {
            continue;
        };
        evaluated += 1;
        confusion.counts[actual][predicted] += 1;
        class_counts[actual] += 1;
        if predicted == actual {
            correct += 1;
        }

        let p_true = row_scores[actual] as f64;
        let loss = -p_true.max(LOG_LOSS_EPSILON).ln();
        total_loss += loss;
        class_loss[actual] += loss;

        if let Some(k) = top_k {
            // ties rank the lower key first, as argmax does
            let true_score = row_scores[actual];
            let rank = row_scores
                .iter()
                .enumerate()
                .filter(|&(j, &s)| s > true_score || (s == true_score && j < actual))
                .count();
            if rank < k {
                top_k_hits += 1;
            }
        }
    }

    if evaluated == 0 {
        return Err(PredictorError::Pipeline(
            "no rows with a known label to evaluate".into(),
        ));
    }

    let n = evaluated as f64;
    let micro_accuracy = correct as f64 / n;

    let present: Vec<usize> = (0..classes).filter(|&c| class_counts[c] > 0).collect();
    let macro_accuracy =
        present.iter().map(|&c| confusion.recall(c)).sum::<f64>() / present.len() as f64;

    let log_loss = total_loss / n;
    let prior_log_loss: f64 = present
        .iter()
        .map(|&c| {
            let p = class_counts[c] as f64 / n;
            -p * p.ln()
        })
        .sum();
    let log_loss_reduction = if prior_log_loss > 0.0 {
        1.0 - log_loss / prior_log_loss
    } else {
        0.0
    };

    let per_class_log_loss = (0..classes)
        .map(|c| {
            if class_counts[c] == 0 {
                f64::NAN
            } else {
                class_loss[c] / class_counts[c] as f64
            }
        })
        .collect();

    Ok(MulticlassMetrics {
        micro_accuracy,
        macro_accuracy,
        log_loss,
        log_loss_reduction,
        top_k,
        top_k_accuracy: top_k.map(|_| top_k_hits as f64 / n),
        per_class_log_loss,
        confusion_matrix: confusion,
        evaluated_rows: evaluated,
        skipped_rows: labels.len() - evaluated,
    })
}
