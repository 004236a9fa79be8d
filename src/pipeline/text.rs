//! Text featurization
//!
//! Turns free text into a sparse term-frequency vector over a dictionary of
//! word n-grams and character n-grams learned from the training column.
//!
//! Normalization: lowercase, non-alphanumeric characters become spaces
//! (unless punctuation is kept), whitespace runs collapse. Word n-grams of
//! length 1..=N are built from the resulting tokens, character n-grams over
//! the normalized text wrapped in `<` and `>` markers. The output vector is
//! L2-normalized.

use super::Transform;
use crate::data::{Column, Frame, SparseVector};
use crate::error::{PredictorError, Result};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

const WORD_PREFIX: &str = "w:";
const CHAR_PREFIX: &str = "c:";

/// Featurizer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextFeaturizerOptions {
    /// Longest word n-gram (0 disables word features)
    pub word_ngram_length: usize,
    /// Character n-gram length (0 disables character features)
    pub char_ngram_length: usize,
    /// Keep punctuation characters as part of tokens
    pub keep_punctuation: bool,
    /// Cap on dictionary size; most frequent n-grams are kept
    pub max_terms: Option<usize>,
}

impl Default for TextFeaturizerOptions {
    fn default() -> Self {
        Self {
            word_ngram_length: 2,
            char_ngram_length: 3,
            keep_punctuation: false,
            max_terms: None,
        }
    }
}

impl TextFeaturizerOptions {
    pub fn validate(&self) -> Result<()> {
        if self.word_ngram_length == 0 && self.char_ngram_length == 0 {
            return Err(PredictorError::Config(
                "featurizer needs word or character n-grams enabled".into(),
            ));
        }
        if self.max_terms == Some(0) {
            return Err(PredictorError::Config("max_terms must be at least 1".into()));
        }
        Ok(())
    }
}

/// Lowercase and collapse everything that is not part of a token into single spaces
pub fn normalize(text: &str, keep_punctuation: bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for ch in text.chars().flat_map(char::to_lowercase) {
        let is_token_char = ch.is_alphanumeric() || (keep_punctuation && !ch.is_whitespace());
        if is_token_char {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch);
        } else {
            pending_space = true;
        }
    }

    out
}

/// Extract the prefixed n-gram terms of one text
fn extract_terms(text: &str, options: &TextFeaturizerOptions) -> Vec<String> {
    let normalized = normalize(text, options.keep_punctuation);
    if normalized.is_empty() {
        return Vec::new();
    }

    let mut terms = Vec::new();

    if options.word_ngram_length > 0 {
        let tokens: Vec<&str> = normalized.split(' ').collect();
        for n in 1..=options.word_ngram_length.min(tokens.len()) {
            for window in tokens.windows(n) {
                terms.push(format!("{}{}", WORD_PREFIX, window.join(" ")));
            }
        }
    }

    if options.char_ngram_length > 0 {
        let chars: Vec<char> = std::iter::once('<')
            .chain(normalized.chars())
            .chain(std::iter::once('>'))
            .collect();
        for window in chars.windows(options.char_ngram_length) {
            let mut term = String::with_capacity(CHAR_PREFIX.len() + window.len() * 4);
            term.push_str(CHAR_PREFIX);
            term.extend(window.iter());
            terms.push(term);
        }
    }

    terms
}

#[derive(Serialize, Deserialize)]
struct FeaturizerState {
    input: String,
    output: String,
    options: TextFeaturizerOptions,
    terms: Vec<String>,
}

/// Fitted featurizer: options plus the learned n-gram dictionary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "FeaturizerState", into = "FeaturizerState")]
pub struct TextFeaturizer {
    input: String,
    output: String,
    options: TextFeaturizerOptions,
    terms: Vec<String>,
    index: FxHashMap<String, u32>,
}

impl From<FeaturizerState> for TextFeaturizer {
    fn from(state: FeaturizerState) -> Self {
        Self::from_terms(state.input, state.output, state.options, state.terms)
    }
}

impl From<TextFeaturizer> for FeaturizerState {
    fn from(featurizer: TextFeaturizer) -> Self {
        Self {
            input: featurizer.input,
            output: featurizer.output,
            options: featurizer.options,
            terms: featurizer.terms,
        }
    }
}

impl TextFeaturizer {
    fn from_terms(input: String, output: String, options: TextFeaturizerOptions, terms: Vec<String>) -> Self {
        let index = terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i as u32))
            .collect();
        Self {
            input,
            output,
            options,
            terms,
            index,
        }
    }

    /// Learn the n-gram dictionary from a text column
    pub fn fit(input: &str, output: &str, options: &TextFeaturizerOptions, texts: &[String]) -> Result<Self> {
        options.validate()?;

        let mut counts: FxHashMap<String, usize> = FxHashMap::default();
        for text in texts {
            for term in extract_terms(text, options) {
                *counts.entry(term).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
        if let Some(cap) = options.max_terms {
            ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            ranked.truncate(cap);
        }
        let mut terms: Vec<String> = ranked.into_iter().map(|(t, _)| t).collect();
        terms.sort_unstable();

        debug!("Featurizer '{}' learned {} terms from {} rows", input, terms.len(), texts.len());

        Ok(Self::from_terms(input.to_string(), output.to_string(), options.clone(), terms))
    }

    pub fn dimension(&self) -> usize {
        self.terms.len()
    }

    pub fn options(&self) -> &TextFeaturizerOptions {
        &self.options
    }

    /// Featurize a single text
    pub fn featurize(&self, text: &str) -> SparseVector {
        let mut counts: FxHashMap<u32, f32> = FxHashMap::default();
        for term in extract_terms(text, &self.options) {
            if let Some(&idx) = self.index.get(&term) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }
        let mut vector = SparseVector::from_map(counts);
        vector.l2_normalize();
        vector
    }
}

impl Transform for TextFeaturizer {
    fn name(&self) -> &'static str {
        "FeaturizeText"
    }

    fn apply(&self, frame: &mut Frame) -> Result<()> {
        let rows: Vec<SparseVector> = frame
            .text(&self.input)?
            .par_iter()
            .map(|text| self.featurize(text))
            .collect();
        frame.insert(
            self.output.clone(),
            Column::Vector {
                rows,
                dimension: self.dimension(),
            },
        )
    }
}
