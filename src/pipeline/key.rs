//! Categorical value <-> key mapping

use super::Transform;
use crate::data::{Column, Frame};
use crate::error::Result;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Serialize, Deserialize)]
struct ValueToKeyState {
    input: String,
    output: String,
    vocabulary: Vec<String>,
}

/// Maps text values to keys. Vocabulary is in order of first occurrence in
/// the training column; empty values are never added.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "ValueToKeyState", into = "ValueToKeyState")]
pub struct ValueToKey {
    input: String,
    output: String,
    vocabulary: Arc<Vec<String>>,
    index: FxHashMap<String, u32>,
}

impl From<ValueToKeyState> for ValueToKey {
    fn from(state: ValueToKeyState) -> Self {
        Self::with_vocabulary(state.input, state.output, state.vocabulary)
    }
}

impl From<ValueToKey> for ValueToKeyState {
    fn from(mapper: ValueToKey) -> Self {
        Self {
            input: mapper.input,
            output: mapper.output,
            vocabulary: mapper.vocabulary.as_ref().clone(),
        }
    }
}

impl ValueToKey {
    fn with_vocabulary(input: String, output: String, vocabulary: Vec<String>) -> Self {
        let index = vocabulary
            .iter()
            .enumerate()
            .map(|(i, v)| (v.clone(), i as u32))
            .collect();
        Self {
            input,
            output,
            vocabulary: Arc::new(vocabulary),
            index,
        }
    }

    pub fn fit(input: &str, output: &str, values: &[String]) -> Self {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut vocabulary = Vec::new();
        for value in values {
            if value.is_empty() {
                continue;
            }
            if seen.insert(value.as_str()) {
                vocabulary.push(value.clone());
            }
        }
        Self::with_vocabulary(input.to_string(), output.to_string(), vocabulary)
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn key_of(&self, value: &str) -> Option<u32> {
        self.index.get(value).copied()
    }
}

impl Transform for ValueToKey {
    fn name(&self) -> &'static str {
        "MapValueToKey"
    }

    fn apply(&self, frame: &mut Frame) -> Result<()> {
        let keys = frame
            .text(&self.input)?
            .iter()
            .map(|v| self.key_of(v))
            .collect();
        frame.insert(
            self.output.clone(),
            Column::Key {
                keys,
                vocabulary: Arc::clone(&self.vocabulary),
            },
        )
    }
}

/// Maps keys back to their text values; missing keys decode to an empty string
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyToValue {
    input: String,
    output: String,
    vocabulary: Vec<String>,
}

impl KeyToValue {
    /// Capture the vocabulary carried by the input key column
    pub fn fit(input: &str, output: &str, frame: &Frame) -> Result<Self> {
        let (_, vocabulary) = frame.keys(input)?;
        Ok(Self {
            input: input.to_string(),
            output: output.to_string(),
            vocabulary: vocabulary.as_ref().clone(),
        })
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn value_of(&self, key: Option<u32>) -> String {
        key.and_then(|k| self.vocabulary.get(k as usize))
            .cloned()
            .unwrap_or_default()
    }
}

impl Transform for KeyToValue {
    fn name(&self) -> &'static str {
        "MapKeyToValue"
    }

    fn apply(&self, frame: &mut Frame) -> Result<()> {
        let (keys, _) = frame.keys(&self.input)?;
        let values = keys.iter().map(|k| self.value_of(*k)).collect();
        frame.insert(self.output.clone(), Column::Text(values))
    }
}
