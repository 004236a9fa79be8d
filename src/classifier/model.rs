//! Maximum-entropy (multinomial logistic regression) model
//!
//! One dense weight row and one bias per class. Inference is a sparse dot
//! product per class followed by a softmax.

use crate::data::SparseVector;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaxEntModel {
    /// Class names, indexed by label key
    labels: Vec<String>,
    /// Input feature dimension
    dimension: usize,
    /// Weights [classes x dimension]
    weights: Vec<Vec<f32>>,
    /// Biases [classes]
    biases: Vec<f32>,
}

impl MaxEntModel {
    /// All-zero model; every class starts equally likely
    pub fn zeros(labels: Vec<String>, dimension: usize) -> Self {
        let classes = labels.len();
        Self {
            labels,
            dimension,
            weights: vec![vec![0.0; dimension]; classes],
            biases: vec![0.0; classes],
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn num_classes(&self) -> usize {
        self.labels.len()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Raw class scores (before softmax)
    pub fn logits(&self, features: &SparseVector) -> Vec<f32> {
        self.weights
            .iter()
            .zip(&self.biases)
            .map(|(row, bias)| features.dot(row) + bias)
            .collect()
    }

    /// Class probabilities
    pub fn probabilities(&self, features: &SparseVector) -> Vec<f32> {
        softmax(&self.logits(features))
    }

    /// True when no weight or bias has overflowed to NaN or infinity
    pub fn is_finite(&self) -> bool {
        self.biases.iter().all(|b| b.is_finite())
            && self.weights.iter().flatten().all(|w| w.is_finite())
    }

    pub(crate) fn weights_mut(&mut self) -> (&mut [Vec<f32>], &mut [f32]) {
        (&mut self.weights, &mut self.biases)
    }
}

/// Numerically stable softmax
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Index of the highest score; the lowest index wins ties
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &s) in scores.iter().enumerate() {
        match best {
            Some((_, b)) if s <= b => {}
            _ => best = Some((i, s)),
        }
    }
    best.map(|(i, _)| i)
}
