//! Issue classifier - multiclass GitHub issue area prediction
//!
//! Learns to assign an area label (e.g. `area-System.Net`) to an issue
//! from its title and description. Text is featurized into word and
//! character n-gram vectors and scored by a maximum-entropy model.
//!
//! ```no_run
//! use issue_classifier::Predictor;
//!
//! # fn main() -> issue_classifier::Result<()> {
//! let mut predictor = Predictor::new();
//! predictor.load_train_data("data/issues_train.tsv")?;
//! predictor.load_test_data("data/issues_test.tsv")?;
//! predictor.build_and_train_model()?;
//!
//! let metrics = predictor.evaluate_model_metrics()?;
//! println!("micro accuracy: {:.3}", metrics.micro_accuracy);
//!
//! let area = predictor.predict("DataTable not updated", "DataAdapter.Update ignores rows")?;
//! predictor.save_model("issues.model")?;
//! # let _ = area;
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod classifier;
pub mod config;
pub mod data;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod predictor;

pub use classifier::{MaxEntOptions, MulticlassMetrics};
pub use config::{load_config, ClassifierConfig};
pub use data::IssueDataset;
pub use error::{PredictorError, Result};
pub use models::{GitHubIssue, IssuePrediction};
pub use pipeline::TextFeaturizerOptions;
pub use predictor::{Predictor, PredictorState, TrainedModel};
