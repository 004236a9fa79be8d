//! Declarative transform pipeline
//!
//! A pipeline is an ordered list of [`StepSpec`] records. Fitting walks the
//! list front to back: each step is fitted against the current frame, then
//! the fitted step transforms that frame before the next one is fitted.
//! The result is a [`FittedPipeline`], a plain list of fitted steps that is
//! applied the same way at prediction time.
//!
//! ```text
//! Area ──MapValueToKey──▶ Label ─────────────────────────────┐
//! Title ──FeaturizeText──▶ TitleFeaturized ──┐               │
//!                                            ├─Concatenate─▶ Features ──MaximumEntropy──▶ Score, PredictedLabel(key)
//! Description ─FeaturizeText─▶ DescriptionFeaturized ──┘                                   │
//!                                                                  PredictedLabel(text) ◀──MapKeyToValue
//! ```

mod concat;
mod key;
pub mod text;
mod trainer;

pub use concat::Concatenate;
pub use key::{KeyToValue, ValueToKey};
pub use text::{TextFeaturizer, TextFeaturizerOptions};
pub use trainer::MaxEntScorer;

use crate::classifier::{MaxEntModel, MaxEntOptions, TrainReport};
use crate::data::{Frame, AREA_COLUMN, DESCRIPTION_COLUMN, TITLE_COLUMN};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const LABEL_COLUMN: &str = "Label";
pub const TITLE_FEATURES_COLUMN: &str = "TitleFeaturized";
pub const DESCRIPTION_FEATURES_COLUMN: &str = "DescriptionFeaturized";
pub const FEATURES_COLUMN: &str = "Features";
pub const SCORE_COLUMN: &str = "Score";
pub const PREDICTED_LABEL_COLUMN: &str = "PredictedLabel";

/// A fitted stage that rewrites a frame in place
pub trait Transform {
    fn name(&self) -> &'static str;

    /// Read input columns and insert output columns
    fn apply(&self, frame: &mut Frame) -> Result<()>;
}

/// Configuration record for one pipeline stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StepSpec {
    MapValueToKey {
        input: String,
        output: String,
    },
    FeaturizeText {
        input: String,
        output: String,
        options: TextFeaturizerOptions,
    },
    Concatenate {
        output: String,
        inputs: Vec<String>,
    },
    /// Marks the point whose output is reused by the trainer. Fitting is
    /// eager, so every column before it is already materialized.
    CacheCheckpoint,
    MaximumEntropy {
        label: String,
        features: String,
        options: MaxEntOptions,
    },
    MapKeyToValue {
        input: String,
        output: String,
    },
}

impl StepSpec {
    pub fn name(&self) -> &'static str {
        match self {
            StepSpec::MapValueToKey { .. } => "MapValueToKey",
            StepSpec::FeaturizeText { .. } => "FeaturizeText",
            StepSpec::Concatenate { .. } => "Concatenate",
            StepSpec::CacheCheckpoint => "CacheCheckpoint",
            StepSpec::MaximumEntropy { .. } => "MaximumEntropy",
            StepSpec::MapKeyToValue { .. } => "MapKeyToValue",
        }
    }

    /// Fit against `frame`. Returns `None` for stages with nothing to learn
    /// or apply.
    fn fit(&self, frame: &Frame, reports: &mut Vec<TrainReport>) -> Result<Option<FittedStep>> {
        let fitted = match self {
            StepSpec::MapValueToKey { input, output } => {
                FittedStep::ValueToKey(ValueToKey::fit(input, output, frame.text(input)?))
            }
            StepSpec::FeaturizeText {
                input,
                output,
                options,
            } => FittedStep::Text(TextFeaturizer::fit(input, output, options, frame.text(input)?)?),
            StepSpec::Concatenate { output, inputs } => {
                FittedStep::Concat(Concatenate::fit(output, inputs, frame)?)
            }
            StepSpec::CacheCheckpoint => return Ok(None),
            StepSpec::MaximumEntropy {
                label,
                features,
                options,
            } => {
                let (scorer, report) = MaxEntScorer::fit(label, features, options, frame)?;
                reports.push(report);
                FittedStep::MaxEnt(scorer)
            }
            StepSpec::MapKeyToValue { input, output } => {
                FittedStep::KeyToValue(KeyToValue::fit(input, output, frame)?)
            }
        };
        Ok(Some(fitted))
    }
}

/// A fitted stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FittedStep {
    ValueToKey(ValueToKey),
    Text(TextFeaturizer),
    Concat(Concatenate),
    MaxEnt(MaxEntScorer),
    KeyToValue(KeyToValue),
}

impl FittedStep {
    fn as_transform(&self) -> &dyn Transform {
        match self {
            FittedStep::ValueToKey(t) => t,
            FittedStep::Text(t) => t,
            FittedStep::Concat(t) => t,
            FittedStep::MaxEnt(t) => t,
            FittedStep::KeyToValue(t) => t,
        }
    }
}

impl Transform for FittedStep {
    fn name(&self) -> &'static str {
        self.as_transform().name()
    }

    fn apply(&self, frame: &mut Frame) -> Result<()> {
        self.as_transform().apply(frame)
    }
}

/// Ordered list of stage specs, built with `append`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EstimatorChain {
    steps: Vec<StepSpec>,
}

impl EstimatorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(mut self, step: StepSpec) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(&self) -> &[StepSpec] {
        &self.steps
    }

    /// The issue area pipeline: label to key, featurize title and
    /// description, concatenate, cache, train, decode the predicted key
    pub fn issue_classification(featurizer: &TextFeaturizerOptions, trainer: &MaxEntOptions) -> Self {
        Self::new()
            .append(StepSpec::MapValueToKey {
                input: AREA_COLUMN.into(),
                output: LABEL_COLUMN.into(),
            })
            .append(StepSpec::FeaturizeText {
                input: TITLE_COLUMN.into(),
                output: TITLE_FEATURES_COLUMN.into(),
                options: featurizer.clone(),
            })
            .append(StepSpec::FeaturizeText {
                input: DESCRIPTION_COLUMN.into(),
                output: DESCRIPTION_FEATURES_COLUMN.into(),
                options: featurizer.clone(),
            })
            .append(StepSpec::Concatenate {
                output: FEATURES_COLUMN.into(),
                inputs: vec![
                    TITLE_FEATURES_COLUMN.into(),
                    DESCRIPTION_FEATURES_COLUMN.into(),
                ],
            })
            .append(StepSpec::CacheCheckpoint)
            .append(StepSpec::MaximumEntropy {
                label: LABEL_COLUMN.into(),
                features: FEATURES_COLUMN.into(),
                options: trainer.clone(),
            })
            .append(StepSpec::MapKeyToValue {
                input: PREDICTED_LABEL_COLUMN.into(),
                output: PREDICTED_LABEL_COLUMN.into(),
            })
    }

    /// Fit every stage in order. `frame` ends up holding the fully
    /// transformed training data.
    pub fn fit(&self, frame: &mut Frame) -> Result<(FittedPipeline, Vec<TrainReport>)> {
        let mut fitted = Vec::with_capacity(self.steps.len());
        let mut reports = Vec::new();

        for spec in &self.steps {
            debug!("Fitting pipeline step {} on {} rows", spec.name(), frame.len());
            if let Some(step) = spec.fit(frame, &mut reports)? {
                step.apply(frame)?;
                fitted.push(step);
            }
        }

        Ok((FittedPipeline { steps: fitted }, reports))
    }
}

/// Fitted stages, applied in order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedPipeline {
    steps: Vec<FittedStep>,
}

impl FittedPipeline {
    pub fn steps(&self) -> &[FittedStep] {
        &self.steps
    }

    pub fn transform(&self, frame: &mut Frame) -> Result<()> {
        for step in &self.steps {
            step.apply(frame)?;
        }
        Ok(())
    }

    /// The trained model, if the pipeline contains a trainer stage
    pub fn model(&self) -> Option<&MaxEntModel> {
        self.steps.iter().find_map(|s| match s {
            FittedStep::MaxEnt(scorer) => Some(scorer.model()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::issues_to_frame;
    use crate::models::GitHubIssue;

    fn issue(title: &str, description: &str, area: &str) -> GitHubIssue {
        GitHubIssue {
            title: title.into(),
            description: description.into(),
            area: area.into(),
        }
    }

    fn training_issues() -> Vec<GitHubIssue> {
        vec![
            issue("Socket timeout", "HttpClient request hangs on socket connect", "net"),
            issue("DNS failure", "Socket connect fails after dns lookup", "net"),
            issue("HttpClient proxy", "request through proxy never completes", "net"),
            issue("File locked", "FileStream cannot open file, file is locked", "io"),
            issue("Directory delete", "Directory.Delete fails on read only file", "io"),
            issue("Path too long", "File path exceeds limit when opening stream", "io"),
        ]
    }

    #[test]
    fn test_issue_chain_has_expected_stages() {
        let chain = EstimatorChain::issue_classification(
            &TextFeaturizerOptions::default(),
            &MaxEntOptions::default(),
        );
        let names: Vec<_> = chain.steps().iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                "MapValueToKey",
                "FeaturizeText",
                "FeaturizeText",
                "Concatenate",
                "CacheCheckpoint",
                "MaximumEntropy",
                "MapKeyToValue"
            ]
        );
    }

    #[test]
    fn test_fit_then_transform_new_rows() {
        let chain = EstimatorChain::issue_classification(
            &TextFeaturizerOptions::default(),
            &MaxEntOptions::default(),
        );
        let mut frame = issues_to_frame(&training_issues()).unwrap();
        let (pipeline, reports) = chain.fit(&mut frame).unwrap();

        // checkpoint is not a fitted stage
        assert_eq!(pipeline.steps().len(), 6);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].examples, 6);
        assert_eq!(pipeline.model().unwrap().labels(), &["net".to_string(), "io".to_string()]);

        let mut fresh = issues_to_frame(&[
            issue("HttpClient socket hangs", "request never completes", ""),
            issue("Cannot open file", "FileStream says the file is locked", ""),
        ])
        .unwrap();
        pipeline.transform(&mut fresh).unwrap();

        let predicted = fresh.text(PREDICTED_LABEL_COLUMN).unwrap();
        assert_eq!(predicted, &["net".to_string(), "io".to_string()]);
        let scores = fresh.scores(SCORE_COLUMN).unwrap();
        assert!(scores.iter().all(|s| (s.iter().sum::<f32>() - 1.0).abs() < 1e-4));
    }

    #[test]
    fn test_transform_requires_input_columns() {
        let chain = EstimatorChain::issue_classification(
            &TextFeaturizerOptions::default(),
            &MaxEntOptions::default(),
        );
        let mut frame = issues_to_frame(&training_issues()).unwrap();
        let (pipeline, _) = chain.fit(&mut frame).unwrap();

        let mut empty = Frame::new(0);
        assert!(pipeline.transform(&mut empty).is_err());
    }
}
