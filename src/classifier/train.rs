//! Training for the maximum-entropy classifier
//!
//! Plain SGD on the softmax cross-entropy over shuffled examples. L2
//! regularization is applied to the coordinates an example touches, which
//! keeps each update proportional to the example's non-zeros.

use super::model::MaxEntModel;
use crate::data::SparseVector;
use crate::error::{PredictorError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Trainer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaxEntOptions {
    /// Passes over the training data
    pub epochs: usize,
    /// Initial learning rate
    pub learning_rate: f32,
    /// Learning rate decay: lr / (1 + decay * epoch)
    pub decay: f32,
    /// L2 regularization strength
    pub l2_regularization: f32,
    /// Shuffle seed
    pub seed: u64,
}

impl Default for MaxEntOptions {
    fn default() -> Self {
        Self {
            epochs: 40,
            learning_rate: 0.5,
            decay: 0.05,
            l2_regularization: 1e-4,
            seed: 1,
        }
    }
}

impl MaxEntOptions {
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(PredictorError::Config("epochs must be at least 1".into()));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(PredictorError::Config("learning_rate must be positive".into()));
        }
        if self.decay < 0.0 || self.l2_regularization < 0.0 {
            return Err(PredictorError::Config(
                "decay and l2_regularization cannot be negative".into(),
            ));
        }
        Ok(())
    }
}

/// Training summary
#[derive(Debug, Clone)]
pub struct TrainReport {
    /// Examples used for training
    pub examples: usize,
    /// Rows skipped because their label key was missing
    pub skipped: usize,
    /// Mean cross-entropy over the last epoch
    pub final_loss: f32,
    pub epochs: usize,
}

/// Fit a model to labeled sparse feature vectors.
///
/// `labels` holds one optional key per row, indexing into `classes`.
pub fn train(
    features: &[SparseVector],
    labels: &[Option<u32>],
    classes: &[String],
    dimension: usize,
    options: &MaxEntOptions,
) -> Result<(MaxEntModel, TrainReport)> {
    options.validate()?;

    if features.len() != labels.len() {
        return Err(PredictorError::Pipeline(format!(
            "feature count ({}) does not match label count ({})",
            features.len(),
            labels.len()
        )));
    }
    if classes.len() < 2 {
        return Err(PredictorError::Pipeline(format!(
            "need at least 2 label classes to train, found {}",
            classes.len()
        )));
    }

    let mut examples: Vec<(usize, usize)> = labels
        .iter()
        .enumerate()
        .filter_map(|(row, key)| {
            key.map(|k| k as usize)
                .filter(|k| *k < classes.len())
                .map(|k| (row, k))
        })
        .collect();
    let skipped = labels.len() - examples.len();

    if examples.is_empty() {
        return Err(PredictorError::Pipeline("no labeled rows to train on".into()));
    }

    info!(
        "Training maximum-entropy model: {} examples, {} classes, {} features",
        examples.len(),
        classes.len(),
        dimension
    );

    let mut model = MaxEntModel::zeros(classes.to_vec(), dimension);
    let mut rng = ChaCha8Rng::seed_from_u64(options.seed);
    let mut final_loss = 0.0;

    for epoch in 0..options.epochs {
        examples.shuffle(&mut rng);
        let lr = options.learning_rate / (1.0 + options.decay * epoch as f32);
        let mut epoch_loss = 0.0;

        for &(row, target) in &examples {
            let x = &features[row];
            let mut grad = model.probabilities(x);
            epoch_loss -= grad[target].max(1e-15).ln();
            grad[target] -= 1.0;

            let (weights, biases) = model.weights_mut();
            for (class, g) in grad.iter().enumerate() {
                biases[class] -= lr * g;
                let w = &mut weights[class];
                for (i, v) in x.iter() {
                    if let Some(wi) = w.get_mut(i as usize) {
                        *wi -= lr * (g * v + options.l2_regularization * *wi);
                    }
                }
            }
        }

        final_loss = epoch_loss / examples.len() as f32;
        if !final_loss.is_finite() || !model.is_finite() {
            return Err(PredictorError::Pipeline(format!(
                "training diverged in epoch {} (learning_rate {}); lower the learning rate",
                epoch + 1,
                options.learning_rate
            )));
        }
        debug!("Epoch {}/{}: loss={:.4}, lr={:.4}", epoch + 1, options.epochs, final_loss, lr);
    }

    info!("Training finished: loss={:.4}", final_loss);

    Ok((
        model,
        TrainReport {
            examples: examples.len(),
            skipped,
            final_loss,
            epochs: options.epochs,
        },
    ))
}
