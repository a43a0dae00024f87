//! Sample record encoding
//!
//! Records are encoded with bincode's standard configuration and must
//! round-trip byte-exact. Decoding validates the vector length against the
//! store's configured shape so a record written under a different shape (or
//! a truncated/garbled record) surfaces as [`StoreError::CorruptSample`]
//! instead of leaking a malformed sample to callers.

use crate::error::{Result, StoreError};
use crate::types::Sample;
use bincode::config;

/// Encoder/decoder for sample records with a fixed vector length
#[derive(Debug, Clone, Copy)]
pub struct SampleCodec {
    vector_len: usize,
}

impl SampleCodec {
    /// Create a codec expecting vectors of the given length
    pub fn new(vector_len: usize) -> Self {
        Self { vector_len }
    }

    /// Encode a sample into an opaque byte record
    ///
    /// Deterministic; always succeeds for a structurally valid sample.
    pub fn encode(&self, sample: &Sample) -> Result<Vec<u8>> {
        bincode::encode_to_vec(sample, config::standard())
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Decode a byte record back into a sample
    ///
    /// Fails with [`StoreError::CorruptSample`] when the byte layout is
    /// malformed, the record carries trailing garbage, or the decoded vector
    /// length does not match the configured shape.
    pub fn decode(&self, bytes: &[u8]) -> Result<Sample> {
        let (sample, consumed): (Sample, usize) =
            bincode::decode_from_slice(bytes, config::standard())
                .map_err(|e| StoreError::CorruptSample(e.to_string()))?;

        if consumed != bytes.len() {
            return Err(StoreError::CorruptSample(format!(
                "record has {} trailing bytes",
                bytes.len() - consumed
            )));
        }
        if sample.vector.len() != self.vector_len {
            return Err(StoreError::CorruptSample(format!(
                "decoded vector length {} does not match configured length {}",
                sample.vector.len(),
                self.vector_len
            )));
        }

        Ok(sample)
    }
}
