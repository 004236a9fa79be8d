use super::{Transform, PREDICTED_LABEL_COLUMN, SCORE_COLUMN};
use crate::classifier::{self, argmax, MaxEntModel, MaxEntOptions, TrainReport};
use crate::data::{Column, Frame};
use crate::error::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Fitted trainer stage: scores a feature column, emitting `Score` and a
/// `PredictedLabel` key column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaxEntScorer {
    features: String,
    model: MaxEntModel,
}

impl MaxEntScorer {
    pub fn fit(label: &str, features: &str, options: &MaxEntOptions, frame: &Frame) -> Result<(Self, TrainReport)> {
        let (keys, classes) = frame.keys(label)?;
        let (vectors, dimension) = frame.vectors(features)?;
        let (model, report) = classifier::train(vectors, keys, classes, dimension, options)?;
        Ok((
            Self {
                features: features.to_string(),
                model,
            },
            report,
        ))
    }

    pub fn model(&self) -> &MaxEntModel {
        &self.model
    }
}

impl Transform for MaxEntScorer {
    fn name(&self) -> &'static str {
        "MaximumEntropy"
    }

    fn apply(&self, frame: &mut Frame) -> Result<()> {
        let (vectors, _) = frame.vectors(&self.features)?;
        let scores: Vec<Vec<f32>> = vectors
            .par_iter()
            .map(|v| self.model.probabilities(v))
            .collect();
        let keys = scores
            .iter()
            .map(|s| argmax(s).map(|k| k as u32))
            .collect();

        frame.insert(SCORE_COLUMN, Column::Scores(scores))?;
        frame.insert(
            PREDICTED_LABEL_COLUMN,
            Column::Key {
                keys,
                vocabulary: Arc::new(self.model.labels().to_vec()),
            },
        )
    }
}
