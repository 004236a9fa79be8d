//! Classifier configuration
//!
//! Loaded from `issue-classifier.toml` in the working directory, falling
//! back to the user config at `~/.config/issue-classifier/config.toml`.
//! Every field is optional; missing values use the defaults.
//!
//! # Configuration Format
//!
//! ```toml
//! # issue-classifier.toml
//!
//! [featurizer]
//! word_ngram_length = 2
//! char_ngram_length = 3
//! keep_punctuation = false
//! # max_terms = 50000
//!
//! [trainer]
//! epochs = 40
//! learning_rate = 0.5
//! decay = 0.05
//! l2_regularization = 0.0001
//! seed = 1
//!
//! [evaluation]
//! top_k = 3
//! ```

use crate::classifier::MaxEntOptions;
use crate::error::{PredictorError, Result};
use crate::pipeline::TextFeaturizerOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const CONFIG_FILE_NAME: &str = "issue-classifier.toml";

/// Evaluation settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationOptions {
    /// Also report top-k accuracy for this k
    pub top_k: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub featurizer: TextFeaturizerOptions,
    pub trainer: MaxEntOptions,
    pub evaluation: EvaluationOptions,
}

impl ClassifierConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ClassifierConfig =
            toml::from_str(content).map_err(|e| PredictorError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PredictorError::io(path, e))?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        self.featurizer.validate()?;
        self.trainer.validate()?;
        if self.evaluation.top_k == Some(0) {
            return Err(PredictorError::Config("top_k must be at least 1".into()));
        }
        Ok(())
    }

    /// User-level config path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("issue-classifier").join("config.toml"))
    }
}

/// Load configuration for a working directory.
///
/// Tries `issue-classifier.toml` in `dir`, then the user config. A file
/// that fails to parse is logged and skipped; with nothing found the
/// defaults are returned.
pub fn load_config(dir: &Path) -> ClassifierConfig {
    let candidates = std::iter::once(dir.join(CONFIG_FILE_NAME)).chain(ClassifierConfig::user_config_path());

    for path in candidates {
        if !path.exists() {
            continue;
        }
        match ClassifierConfig::from_file(&path) {
            Ok(config) => {
                debug!("Loaded config from {}", path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", path.display(), e);
            }
        }
    }

    debug!("No config found, using defaults");
    ClassifierConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ClassifierConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.featurizer.word_ngram_length, 2);
        assert_eq!(config.featurizer.char_ngram_length, 3);
        assert_eq!(config.evaluation.top_k, None);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ClassifierConfig::from_toml_str(
            r#"
[trainer]
epochs = 5
seed = 42

[evaluation]
top_k = 3
"#,
        )
        .unwrap();
        assert_eq!(config.trainer.epochs, 5);
        assert_eq!(config.trainer.seed, 42);
        assert_eq!(config.trainer.learning_rate, MaxEntOptions::default().learning_rate);
        assert_eq!(config.featurizer, TextFeaturizerOptions::default());
        assert_eq!(config.evaluation.top_k, Some(3));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(ClassifierConfig::from_toml_str("[trainer]\nepochs = 0\n").is_err());
        assert!(ClassifierConfig::from_toml_str("[evaluation]\ntop_k = 0\n").is_err());
        assert!(ClassifierConfig::from_toml_str(
            "[featurizer]\nword_ngram_length = 0\nchar_ngram_length = 0\n"
        )
        .is_err());
        assert!(ClassifierConfig::from_toml_str("[trainer\n").is_err());
    }

    #[test]
    fn test_load_config_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[featurizer]\nmax_terms = 1000\n",
        )
        .unwrap();
        let config = load_config(dir.path());
        assert_eq!(config.featurizer.max_terms, Some(1000));
    }

    #[test]
    fn test_load_config_falls_back_on_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "not = [valid").unwrap();
        // Should not crash; user config may or may not exist on this machine
        let config = load_config(dir.path());
        assert!(config.validate().is_ok());
    }
}
