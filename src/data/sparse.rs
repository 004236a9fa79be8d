//! Sparse feature vectors

use rustc_hash::FxHashMap;

/// Sparse vector with strictly increasing indices
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    indices: Vec<u32>,
    values: Vec<f32>,
}

impl SparseVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an unordered index -> value map, dropping zeros
    pub fn from_map(map: FxHashMap<u32, f32>) -> Self {
        let mut pairs: Vec<(u32, f32)> = map.into_iter().filter(|(_, v)| *v != 0.0).collect();
        pairs.sort_unstable_by_key(|(i, _)| *i);
        let (indices, values) = pairs.into_iter().unzip();
        Self { indices, values }
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    pub fn norm(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Scale to unit L2 norm. Empty or all-zero vectors are left untouched.
    pub fn l2_normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for v in &mut self.values {
                *v /= norm;
            }
        }
    }

    /// Dot product against a dense weight row. Indices past the row are ignored.
    pub fn dot(&self, dense: &[f32]) -> f32 {
        self.iter()
            .filter_map(|(i, v)| dense.get(i as usize).map(|w| w * v))
            .sum()
    }

    /// Append `other` with its indices shifted by `offset`.
    ///
    /// `offset` must be at least one past the last index of `self`.
    pub fn append_shifted(&mut self, other: &SparseVector, offset: u32) {
        debug_assert!(self.indices.last().is_none_or(|&last| last < offset));
        for (i, v) in other.iter() {
            self.indices.push(i + offset);
            self.values.push(v);
        }
    }
}
