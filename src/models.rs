//! Core records: the issue being classified and the prediction produced for it

use serde::{Deserialize, Serialize};

/// A GitHub issue as read from a training or test file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubIssue {
    /// Issue title
    pub title: String,
    /// Issue body
    pub description: String,
    /// Area label (e.g. `area-System.Data`). Empty when unknown.
    pub area: String,
}

impl GitHubIssue {
    /// Build an unlabeled issue for prediction
    pub fn unlabeled(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            area: String::new(),
        }
    }
}

/// Result of classifying one issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuePrediction {
    /// Decoded area label
    pub predicted_area: String,
    /// Class probabilities, ordered by label key (see `TrainedModel::labels`)
    pub scores: Vec<f32>,
}

impl IssuePrediction {
    /// Probability assigned to the predicted area
    pub fn confidence(&self) -> f32 {
        self.scores.iter().copied().fold(0.0, f32::max)
    }
}
