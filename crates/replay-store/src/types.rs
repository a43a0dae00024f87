//! Core types for the replay store

use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};

/// A single labeled training observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct Sample {
    /// Observation vector; length is fixed by [`StoreConfig::vector_len`]
    pub vector: Vec<f32>,
    /// Discrete label in `[0, label_cardinality)`
    pub label: u32,
    /// Unix timestamp (seconds) set when the sample was accepted
    pub created_at: i64,
}

/// Configuration for a replay store
///
/// Set once when the store is created and fixed for its lifetime. Reopening
/// an existing backing file with a different configuration fails with
/// [`StoreError::ConfigMismatch`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Maximum number of live slots; older samples are evicted once exceeded
    pub capacity: u64,
    /// Required observation vector length
    pub vector_len: usize,
    /// Number of distinct labels; valid labels are `[0, label_cardinality)`
    pub label_cardinality: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity: 100_000,
            vector_len: 64,
            label_cardinality: 4096,
        }
    }
}

impl StoreConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(StoreError::InvalidConfig(
                "capacity must be non-zero".to_string(),
            ));
        }
        if self.vector_len == 0 {
            return Err(StoreError::InvalidConfig(
                "vector_len must be non-zero".to_string(),
            ));
        }
        if self.label_cardinality == 0 {
            return Err(StoreError::InvalidConfig(
                "label_cardinality must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Statistics snapshot of a replay store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Total samples ever accepted
    pub total: u64,
    /// Currently retrievable samples: `min(total, capacity)`
    pub actual_size: u64,
    /// Configured slot capacity
    pub capacity: u64,
    /// Whether older slots have been overwritten (`total > capacity`)
    pub wrapped: bool,
}
