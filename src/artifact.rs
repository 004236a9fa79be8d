//! Model file format
//!
//! ```text
//! [magic: 8 bytes "ISSUECLF"][version: u32 LE][xxh3 of payload: u64 LE][payload]
//! ```
//!
//! The payload is a `bitcode` encoding of [`ModelArtifact`]: the input
//! schema, the fitted pipeline stages and some provenance.

use crate::data::Schema;
use crate::error::{PredictorError, Result};
use crate::pipeline::FittedPipeline;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;
use xxhash_rust::xxh3::xxh3_64;

const MAGIC: &[u8; 8] = b"ISSUECLF";
pub const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = MAGIC.len() + 4 + 8;

/// Everything persisted for a trained model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Schema of the data the pipeline was fitted on
    pub schema: Schema,
    pub pipeline: FittedPipeline,
    /// RFC 3339 timestamp
    pub trained_at: String,
    /// Version of this crate that wrote the file
    pub writer_version: String,
}

impl ModelArtifact {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let payload = bitcode::serialize(self)
            .map_err(|e| PredictorError::ModelFormat(format!("failed to encode model: {e}")))?;

        let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&xxh3_64(&payload).to_le_bytes());
        bytes.extend_from_slice(&payload);
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(PredictorError::ModelFormat(format!(
                "file is {} bytes, shorter than the {HEADER_LEN}-byte header",
                bytes.len()
            )));
        }
        let (magic, rest) = bytes.split_at(MAGIC.len());
        if magic != MAGIC {
            return Err(PredictorError::ModelFormat("not an issue classifier model".into()));
        }

        let (version, rest) = rest.split_at(4);
        let version = u32::from_le_bytes(version.try_into().map_err(|_| truncated())?);
        if version != FORMAT_VERSION {
            return Err(PredictorError::ModelFormat(format!(
                "unsupported format version {version} (expected {FORMAT_VERSION})"
            )));
        }

        let (checksum, payload) = rest.split_at(8);
        let checksum = u64::from_le_bytes(checksum.try_into().map_err(|_| truncated())?);
        if xxh3_64(payload) != checksum {
            return Err(PredictorError::ModelFormat("checksum mismatch, file is corrupted".into()));
        }

        bitcode::deserialize(payload)
            .map_err(|e| PredictorError::ModelFormat(format!("failed to decode model: {e}")))
    }

    /// Write to `path`, replacing any existing file
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| PredictorError::io(parent, e))?;
        }
        std::fs::write(path, &bytes).map_err(|e| PredictorError::io(path, e))?;
        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| PredictorError::io(path, e))?;
        Self::from_bytes(&bytes)
    }
}

fn truncated() -> PredictorError {
    PredictorError::ModelFormat("truncated header".into())
}
