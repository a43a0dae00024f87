//! # Replay Store
//!
//! Persistent bounded observation store for capture-to-train pipelines.
//!
//! A fixed-capacity, disk-backed circular buffer that accumulates labeled
//! training samples across process restarts. New samples advance a
//! monotonically increasing sequence counter and reuse physical slots
//! cyclically (FIFO eviction once full); the counter and slot record are
//! committed together in one redb transaction, so the store is exact and
//! restart-safe.
//!
//! - **Random reads**: [`ReplayStore::get_batch`] draws distinct samples
//!   uniformly without replacement for minibatch training, degrading
//!   gracefully when fewer samples exist than requested.
//! - **Sequential reads**: [`ReplayStore::get_sequential_batch`] serves
//!   deterministic windows by logical sequence number for export and tests,
//!   refusing stale windows whose slots have been overwritten.
//!
//! Single process, single logical writer; concurrent calls are safe but
//! conflicting writes simply serialize through the storage substrate.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod codec;
pub mod error;
pub mod slot;
pub mod store;
pub mod types;

// Re-exports for convenience
pub use error::{Result, StoreError};
pub use store::ReplayStore;
pub use types::{Sample, StoreConfig, StoreStats};
