//! Issue area predictor
//!
//! Sequences the workflow: load data → build and train the pipeline →
//! evaluate / predict → save / reload. All state is owned by the
//! `Predictor` instance, so independent predictors never share a model.
//!
//! ```text
//! Uninitialized ──load_train_data──▶ DataLoaded ──build_and_train_model──▶ ModelReady
//!       └──────────────────────load_model──────────────────────────────────────┘
//! ```

use crate::artifact::ModelArtifact;
use crate::classifier::{evaluate, MulticlassMetrics, TrainReport};
use crate::config::ClassifierConfig;
use crate::data::{issue_schema, issues_to_frame, IssueDataset, Schema};
use crate::error::{PredictorError, Result};
use crate::models::{GitHubIssue, IssuePrediction};
use crate::pipeline::{EstimatorChain, FittedPipeline, LABEL_COLUMN, PREDICTED_LABEL_COLUMN, SCORE_COLUMN};
use std::path::Path;
use tracing::{info, warn};

/// Lifecycle of a `Predictor`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictorState {
    Uninitialized,
    DataLoaded,
    ModelReady,
}

/// A fitted pipeline plus the schema of the data it was fitted on.
///
/// Only obtainable by training or by loading a saved model.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pipeline: FittedPipeline,
    schema: Schema,
    trained_at: String,
}

impl TrainedModel {
    fn from_artifact(artifact: ModelArtifact) -> Result<Self> {
        if artifact.pipeline.model().is_none() {
            return Err(PredictorError::ModelFormat(
                "pipeline has no trained classifier stage".into(),
            ));
        }
        Ok(Self {
            pipeline: artifact.pipeline,
            schema: artifact.schema,
            trained_at: artifact.trained_at,
        })
    }

    /// Area labels, in score order
    pub fn labels(&self) -> &[String] {
        self.pipeline.model().map(|m| m.labels()).unwrap_or_default()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn trained_at(&self) -> &str {
        &self.trained_at
    }

    pub fn pipeline(&self) -> &FittedPipeline {
        &self.pipeline
    }

    /// Classify a batch of issues
    pub fn predict_batch(&self, issues: &[GitHubIssue]) -> Result<Vec<IssuePrediction>> {
        let mut frame = issues_to_frame(issues)?;
        self.pipeline.transform(&mut frame)?;

        let areas = frame.text(PREDICTED_LABEL_COLUMN)?;
        let scores = frame.scores(SCORE_COLUMN)?;
        Ok(areas
            .iter()
            .zip(scores)
            .map(|(area, scores)| IssuePrediction {
                predicted_area: area.clone(),
                scores: scores.clone(),
            })
            .collect())
    }

    pub fn predict_issue(&self, issue: &GitHubIssue) -> Result<IssuePrediction> {
        self.predict_batch(std::slice::from_ref(issue))?
            .pop()
            .ok_or_else(|| PredictorError::Pipeline("pipeline produced no prediction".into()))
    }

    /// Predicted area for a title and description
    pub fn predict(&self, title: &str, description: &str) -> Result<String> {
        Ok(self
            .predict_issue(&GitHubIssue::unlabeled(title, description))?
            .predicted_area)
    }

    /// Score the model against labeled issues
    pub fn evaluate(&self, data: &IssueDataset, top_k: Option<usize>) -> Result<MulticlassMetrics> {
        let mut frame = data.to_frame()?;
        self.pipeline.transform(&mut frame)?;

        let (labels, _) = frame.keys(LABEL_COLUMN)?;
        let scores = frame.scores(SCORE_COLUMN)?;
        let metrics = evaluate(scores, labels, self.labels(), top_k)?;
        if metrics.skipped_rows > 0 {
            warn!(
                "{} of {} rows skipped: label missing or not seen in training",
                metrics.skipped_rows,
                data.len()
            );
        }
        Ok(metrics)
    }

    /// Persist to `path`, overwriting any existing file
    pub fn save(&self, path: &Path) -> Result<()> {
        let artifact = ModelArtifact {
            schema: self.schema.clone(),
            pipeline: self.pipeline.clone(),
            trained_at: self.trained_at.clone(),
            writer_version: env!("CARGO_PKG_VERSION").to_string(),
        };
        artifact.save(path)?;
        info!("Model saved to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let model = Self::from_artifact(ModelArtifact::load(path)?)?;
        info!(
            "Loaded model from {} ({} areas, trained {})",
            path.display(),
            model.labels().len(),
            model.trained_at
        );
        Ok(model)
    }
}

/// Orchestrates loading, training, evaluation, prediction and persistence
#[derive(Debug, Default)]
pub struct Predictor {
    config: ClassifierConfig,
    train_data: Option<IssueDataset>,
    test_data: Option<IssueDataset>,
    model: Option<TrainedModel>,
    last_report: Option<TrainReport>,
}

impl Predictor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ClassifierConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn state(&self) -> PredictorState {
        if self.model.is_some() {
            PredictorState::ModelReady
        } else if self.train_data.is_some() {
            PredictorState::DataLoaded
        } else {
            PredictorState::Uninitialized
        }
    }

    /// Load training issues, replacing any previously loaded set.
    /// Returns the row count.
    pub fn load_train_data(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let data = IssueDataset::load(path)?;
        let rows = data.len();
        self.train_data = Some(data);
        Ok(rows)
    }

    /// Load test issues, replacing any previously loaded set.
    /// Returns the row count.
    pub fn load_test_data(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let data = IssueDataset::load(path)?;
        let rows = data.len();
        self.test_data = Some(data);
        Ok(rows)
    }

    pub fn train_data(&self) -> Option<&IssueDataset> {
        self.train_data.as_ref()
    }

    pub fn test_data(&self) -> Option<&IssueDataset> {
        self.test_data.as_ref()
    }

    /// Build the issue pipeline and fit it to the training data, replacing
    /// any model held so far
    pub fn build_and_train_model(&mut self) -> Result<&TrainedModel> {
        let data = self.train_data.as_ref().ok_or(PredictorError::NotReady {
            operation: "train",
            requires: "load training data",
        })?;

        let chain = EstimatorChain::issue_classification(&self.config.featurizer, &self.config.trainer);
        let mut frame = data.to_frame()?;
        let (pipeline, mut reports) = chain.fit(&mut frame)?;

        let model = TrainedModel {
            pipeline,
            schema: issue_schema(),
            trained_at: chrono::Utc::now().to_rfc3339(),
        };
        info!(
            "Trained model on {} issues across {} areas",
            data.len(),
            model.labels().len()
        );

        self.last_report = reports.pop();
        Ok(&*self.model.insert(model))
    }

    /// Summary of the most recent training run
    pub fn last_train_report(&self) -> Option<&TrainReport> {
        self.last_report.as_ref()
    }

    pub fn model(&self) -> Option<&TrainedModel> {
        self.model.as_ref()
    }

    fn require_model(&self, operation: &'static str) -> Result<&TrainedModel> {
        self.model.as_ref().ok_or(PredictorError::NotReady {
            operation,
            requires: "train or load a model",
        })
    }

    /// Evaluate the current model against the loaded test data
    pub fn evaluate_model_metrics(&self) -> Result<MulticlassMetrics> {
        let model = self.require_model("evaluate")?;
        let data = self.test_data.as_ref().ok_or(PredictorError::NotReady {
            operation: "evaluate",
            requires: "load test data",
        })?;
        model.evaluate(data, self.config.evaluation.top_k)
    }

    /// Predicted area for a single issue
    pub fn predict(&self, title: &str, description: &str) -> Result<String> {
        self.require_model("predict")?.predict(title, description)
    }

    /// Predicted area with per-class scores
    pub fn predict_detailed(&self, title: &str, description: &str) -> Result<IssuePrediction> {
        self.require_model("predict")?
            .predict_issue(&GitHubIssue::unlabeled(title, description))
    }

    pub fn save_model(&self, path: impl AsRef<Path>) -> Result<()> {
        self.require_model("save model")?.save(path.as_ref())
    }

    /// Replace the current model with one read from disk. Loaded datasets
    /// are kept; the model's schema is not checked against them.
    pub fn load_model(&mut self, path: impl AsRef<Path>) -> Result<&TrainedModel> {
        let model = TrainedModel::load(path.as_ref())?;
        self.last_report = None;
        Ok(&*self.model.insert(model))
    }
}
