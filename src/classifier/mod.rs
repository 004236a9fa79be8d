//! Multiclass issue classifier
//!
//! Architecture: sparse n-gram features → maximum-entropy (softmax) model
//!
//! The model is linear over L2-normalized term frequencies, trained with
//! seeded SGD so the same data and options always produce the same weights.

pub mod metrics;
pub mod model;
pub mod train;

pub use metrics::{evaluate, ConfusionMatrix, MulticlassMetrics};
pub use model::{argmax, softmax, MaxEntModel};
pub use train::{train, MaxEntOptions, TrainReport};
