//! In-memory tabular value flowing through the pipeline
//!
//! A `Frame` is a set of equally long named columns. Pipeline steps read
//! their input columns by name and insert (or replace) their outputs.

use super::sparse::SparseVector;
use crate::error::{PredictorError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Column type tag, used by `Schema`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Text,
    Key,
    Vector,
    Scores,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub kind: ColumnKind,
}

/// Ordered column names and types
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub columns: Vec<ColumnInfo>,
}

impl Schema {
    pub fn new(columns: impl IntoIterator<Item = (&'static str, ColumnKind)>) -> Self {
        Self {
            columns: columns
                .into_iter()
                .map(|(name, kind)| ColumnInfo {
                    name: name.to_string(),
                    kind,
                })
                .collect(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Column storage
#[derive(Debug, Clone)]
pub enum Column {
    Text(Vec<String>),
    /// Categorical keys plus the vocabulary they index into. `None` is a
    /// missing key (empty or unknown value).
    Key {
        keys: Vec<Option<u32>>,
        vocabulary: Arc<Vec<String>>,
    },
    Vector {
        rows: Vec<SparseVector>,
        dimension: usize,
    },
    /// Dense per-row score vectors
    Scores(Vec<Vec<f32>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Text(v) => v.len(),
            Column::Key { keys, .. } => keys.len(),
            Column::Vector { rows, .. } => rows.len(),
            Column::Scores(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Text(_) => ColumnKind::Text,
            Column::Key { .. } => ColumnKind::Key,
            Column::Vector { .. } => ColumnKind::Vector,
            Column::Scores(_) => ColumnKind::Scores,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Frame {
    rows: usize,
    columns: Vec<(String, Column)>,
}

impl Frame {
    pub fn new(rows: usize) -> Self {
        Self {
            rows,
            columns: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Insert a column, replacing any existing column of the same name
    pub fn insert(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();
        if column.len() != self.rows {
            return Err(PredictorError::Pipeline(format!(
                "column '{}' has {} rows, frame has {}",
                name,
                column.len(),
                self.rows
            )));
        }
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = column,
            None => self.columns.push((name, column)),
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    fn require(&self, name: &str) -> Result<&Column> {
        self.get(name)
            .ok_or_else(|| PredictorError::Pipeline(format!("missing column '{name}'")))
    }

    fn mismatch(name: &str, expected: ColumnKind, found: ColumnKind) -> PredictorError {
        PredictorError::Pipeline(format!(
            "column '{name}' is {found:?}, expected {expected:?}"
        ))
    }

    pub fn text(&self, name: &str) -> Result<&[String]> {
        match self.require(name)? {
            Column::Text(values) => Ok(values),
            other => Err(Self::mismatch(name, ColumnKind::Text, other.kind())),
        }
    }

    pub fn keys(&self, name: &str) -> Result<(&[Option<u32>], &Arc<Vec<String>>)> {
        match self.require(name)? {
            Column::Key { keys, vocabulary } => Ok((keys, vocabulary)),
            other => Err(Self::mismatch(name, ColumnKind::Key, other.kind())),
        }
    }

    pub fn vectors(&self, name: &str) -> Result<(&[SparseVector], usize)> {
        match self.require(name)? {
            Column::Vector { rows, dimension } => Ok((rows, *dimension)),
            other => Err(Self::mismatch(name, ColumnKind::Vector, other.kind())),
        }
    }

    pub fn scores(&self, name: &str) -> Result<&[Vec<f32>]> {
        match self.require(name)? {
            Column::Scores(values) => Ok(values),
            other => Err(Self::mismatch(name, ColumnKind::Scores, other.kind())),
        }
    }

    pub fn schema(&self) -> Schema {
        Schema {
            columns: self
                .columns
                .iter()
                .map(|(name, col)| ColumnInfo {
                    name: name.clone(),
                    kind: col.kind(),
                })
                .collect(),
        }
    }
}
