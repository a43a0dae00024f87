//! Sequence-to-slot mapping
//!
//! The logical sequence counter grows without bound while physical slots are
//! reused cyclically. This module is the single seam between the two: any
//! future change to the eviction policy only touches this mapping.

/// Map a logical sequence number to its physical slot index.
///
/// Pure and total for non-zero capacity; the store validates capacity at
/// construction.
pub fn slot_of(seq: u64, capacity: u64) -> u64 {
    seq % capacity
}
