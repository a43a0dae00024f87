//! Error types for the replay store

use crate::types::StoreConfig;
use thiserror::Error;

/// Result type alias for replay store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Error types that can occur during replay store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Backing file could not be opened or a transaction could not commit
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Invalid store configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The backing file was created with a different store shape
    #[error("configuration mismatch: stored {stored:?}, requested {requested:?}")]
    ConfigMismatch {
        /// Shape persisted in the backing file
        stored: StoreConfig,
        /// Shape requested by the caller
        requested: StoreConfig,
    },

    /// Caller supplied a sample that violates the store's shape
    #[error("invalid sample: {0}")]
    InvalidSample(String),

    /// No retrievable samples exist
    #[error("store is empty")]
    EmptyStore,

    /// Requested sequence number was never assigned
    #[error("offset {offset} out of range: store has accepted {total} samples")]
    OffsetOutOfRange {
        /// Requested starting sequence number
        offset: u64,
        /// Total samples ever accepted
        total: u64,
    },

    /// Requested sequence number has been overwritten by newer data
    #[error("offset {offset} is stale: oldest live sequence number is {oldest_live}")]
    StaleOffset {
        /// Requested starting sequence number
        offset: u64,
        /// Oldest sequence number still resident in a slot
        oldest_live: u64,
    },

    /// A stored record failed to decode
    #[error("corrupt sample record: {0}")]
    CorruptSample(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Operation invoked after `close`
    #[error("store is closed")]
    StoreClosed,
}

impl From<redb::Error> for StoreError {
    fn from(err: redb::Error) -> Self {
        StoreError::StorageUnavailable(err.to_string())
    }
}

impl From<redb::DatabaseError> for StoreError {
    fn from(err: redb::DatabaseError) -> Self {
        StoreError::StorageUnavailable(err.to_string())
    }
}

impl From<redb::StorageError> for StoreError {
    fn from(err: redb::StorageError) -> Self {
        StoreError::StorageUnavailable(err.to_string())
    }
}

impl From<redb::TransactionError> for StoreError {
    fn from(err: redb::TransactionError) -> Self {
        StoreError::StorageUnavailable(err.to_string())
    }
}

impl From<redb::TableError> for StoreError {
    fn from(err: redb::TableError) -> Self {
        StoreError::StorageUnavailable(err.to_string())
    }
}

impl From<redb::CommitError> for StoreError {
    fn from(err: redb::CommitError) -> Self {
        StoreError::StorageUnavailable(err.to_string())
    }
}
