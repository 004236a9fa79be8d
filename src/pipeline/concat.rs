use super::Transform;
use crate::data::{Column, Frame, SparseVector};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Joins vector columns side by side into one feature vector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concatenate {
    output: String,
    inputs: Vec<String>,
    /// Input dimensions captured at fit time
    dimensions: Vec<usize>,
}

impl Concatenate {
    pub fn fit(output: &str, inputs: &[String], frame: &Frame) -> Result<Self> {
        let dimensions = inputs
            .iter()
            .map(|name| frame.vectors(name).map(|(_, dim)| dim))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            output: output.to_string(),
            inputs: inputs.to_vec(),
            dimensions,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimensions.iter().sum()
    }
}

impl Transform for Concatenate {
    fn name(&self) -> &'static str {
        "Concatenate"
    }

    fn apply(&self, frame: &mut Frame) -> Result<()> {
        let mut rows = vec![SparseVector::new(); frame.len()];
        let mut offset = 0u32;
        for (name, dim) in self.inputs.iter().zip(&self.dimensions) {
            let (vectors, _) = frame.vectors(name)?;
            for (out, v) in rows.iter_mut().zip(vectors) {
                out.append_shifted(v, offset);
            }
            offset += *dim as u32;
        }
        frame.insert(
            self.output.clone(),
            Column::Vector {
                rows,
                dimension: self.dimension(),
            },
        )
    }
}
