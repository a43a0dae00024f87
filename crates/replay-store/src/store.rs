//! Circular observation store over redb
//!
//! A fixed-capacity, disk-backed circular buffer of labeled samples. The
//! logical sequence counter and the slot records live in two tables of one
//! redb file; every accept advances the counter and overwrites exactly one
//! slot inside a single write transaction, so a crash mid-write leaves the
//! store exactly as it was before the call.

use crate::codec::SampleCodec;
use crate::error::{Result, StoreError};
use crate::slot::slot_of;
use crate::types::{Sample, StoreConfig, StoreStats};
use parking_lot::RwLock;
use rand::seq::SliceRandom;
use redb::{Database, ReadableTable, TableDefinition};
use std::path::Path;

// Table layout: slot records keyed by big-endian slot index so ordered
// iteration by external tooling walks slots in index order.
const OBSERVATIONS_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("observations");
const META_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");

const COUNT_KEY: &str = "count";
const CONFIG_KEY: &str = "config";

fn slot_key(slot: u64) -> [u8; 8] {
    slot.to_be_bytes()
}

fn read_count(table: &impl ReadableTable<&'static str, &'static [u8]>) -> Result<u64> {
    match table.get(COUNT_KEY)? {
        Some(raw) => {
            let bytes: [u8; 8] = raw.value().try_into().map_err(|_| {
                StoreError::StorageUnavailable("counter record is not 8 bytes".to_string())
            })?;
            Ok(u64::from_be_bytes(bytes))
        }
        None => Ok(0),
    }
}

/// Persistent bounded observation store
///
/// Accepts `(vector, label)` pairs from the capture side and serves random
/// minibatches and deterministic sequential windows to the training side.
/// Once `capacity` samples have been accepted, each new sample silently
/// evicts the oldest occupant of its slot (FIFO by sequence number).
///
/// All operations take `&self` and are safe to call from multiple threads;
/// redb serializes conflicting write transactions and readers observe either
/// the pre- or post-write state of the counter+slot pair, never a torn pair.
pub struct ReplayStore {
    db: RwLock<Option<Database>>,
    config: StoreConfig,
    codec: SampleCodec,
}

impl ReplayStore {
    /// Create or open a replay store at the given path
    ///
    /// Fails with [`StoreError::StorageUnavailable`] if the backing file
    /// cannot be created or is locked by another process, and with
    /// [`StoreError::ConfigMismatch`] if the file was created under a
    /// different shape. On success [`count_samples`](Self::count_samples)
    /// reflects whatever counter was last persisted (0 for a fresh store).
    pub fn open<P: AsRef<Path>>(path: P, config: StoreConfig) -> Result<Self> {
        config.validate()?;

        let db = Database::create(path.as_ref())
            .map_err(|e| StoreError::StorageUnavailable(e.to_string()))?;

        // Initialize both tables and pin the store shape on first open.
        let write_txn = db.begin_write()?;
        let stored_config: Option<StoreConfig> = {
            let _ = write_txn.open_table(OBSERVATIONS_TABLE)?;
            let mut meta = write_txn.open_table(META_TABLE)?;

            let existing = match meta.get(CONFIG_KEY)? {
                Some(raw) => Some(
                    serde_json::from_slice(raw.value())
                        .map_err(|e| StoreError::Serialization(e.to_string()))?,
                ),
                None => None,
            };

            if existing.is_none() {
                let blob = serde_json::to_vec(&config)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                meta.insert(CONFIG_KEY, blob.as_slice())?;
            }
            existing
        };

        if let Some(stored) = stored_config {
            if stored != config {
                // Drop without commit; reinterpreting slots under a different
                // capacity or vector length would corrupt the mapping.
                return Err(StoreError::ConfigMismatch {
                    stored,
                    requested: config,
                });
            }
        }
        write_txn.commit()?;

        let store = Self {
            db: RwLock::new(Some(db)),
            codec: SampleCodec::new(config.vector_len),
            config,
        };

        tracing::info!(
            "Opened replay store with {} samples (capacity {})",
            store.count_samples()?,
            store.config.capacity
        );

        Ok(store)
    }

    /// The configuration this store was opened with
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Accept a sample, returning its assigned sequence number
    ///
    /// Fails with [`StoreError::InvalidSample`] when the vector length or
    /// label violates the store shape; the counter and all slots are then
    /// unchanged. On success the sample (stamped with the current time) is
    /// written to slot `seq % capacity` and the counter advances to `seq + 1`
    /// in one atomic transaction.
    pub fn store_sample(&self, vector: &[f32], label: u32) -> Result<u64> {
        if vector.len() != self.config.vector_len {
            return Err(StoreError::InvalidSample(format!(
                "expected vector length {}, got {}",
                self.config.vector_len,
                vector.len()
            )));
        }
        if label >= self.config.label_cardinality {
            return Err(StoreError::InvalidSample(format!(
                "label {} outside [0, {})",
                label, self.config.label_cardinality
            )));
        }

        let sample = Sample {
            vector: vector.to_vec(),
            label,
            created_at: chrono::Utc::now().timestamp(),
        };
        let record = self.codec.encode(&sample)?;

        self.with_db(|db| {
            let write_txn = db.begin_write()?;
            let seq;
            {
                let mut meta = write_txn.open_table(META_TABLE)?;
                seq = read_count(&meta)?;

                let mut observations = write_txn.open_table(OBSERVATIONS_TABLE)?;
                let slot = slot_of(seq, self.config.capacity);
                observations.insert(slot_key(slot).as_slice(), record.as_slice())?;
                meta.insert(COUNT_KEY, (seq + 1).to_be_bytes().as_slice())?;
            }
            write_txn.commit()?;
            Ok(seq)
        })
    }

    /// Total number of samples ever accepted
    ///
    /// Monotonic and restart-stable; reset only by [`clear`](Self::clear).
    pub fn count_samples(&self) -> Result<u64> {
        self.with_db(|db| {
            let read_txn = db.begin_read()?;
            let meta = read_txn.open_table(META_TABLE)?;
            read_count(&meta)
        })
    }

    /// Number of currently valid, retrievable slots: `min(count, capacity)`
    pub fn actual_size(&self) -> Result<u64> {
        Ok(self.count_samples()?.min(self.config.capacity))
    }

    /// Draw up to `n` distinct samples uniformly at random
    ///
    /// Fails with [`StoreError::EmptyStore`] when no samples are retrievable.
    /// Otherwise draws `min(n, actual_size)` distinct slot indices without
    /// replacement; a slot whose record fails to decode is skipped and a
    /// replacement is drawn from the remaining pool, so the result reaches
    /// the target count whenever enough valid records exist. Termination is
    /// bounded by the finite, strictly shrinking candidate pool.
    pub fn get_batch(&self, n: usize) -> Result<Vec<Sample>> {
        self.with_db(|db| {
            let read_txn = db.begin_read()?;
            let meta = read_txn.open_table(META_TABLE)?;
            let live = read_count(&meta)?.min(self.config.capacity);
            if live == 0 {
                return Err(StoreError::EmptyStore);
            }

            let target = (n as u64).min(live) as usize;
            if target == 0 {
                return Ok(Vec::new());
            }

            let mut candidates: Vec<u64> = (0..live).collect();
            candidates.shuffle(&mut rand::thread_rng());

            let observations = read_txn.open_table(OBSERVATIONS_TABLE)?;
            let mut batch = Vec::with_capacity(target);
            for slot in candidates {
                if batch.len() == target {
                    break;
                }
                if let Some(sample) = self.read_slot(&observations, slot)? {
                    batch.push(sample);
                }
            }

            // Corruption may shrink the result, but samples exist, so an
            // empty batch means nothing valid could be produced at all.
            if batch.is_empty() {
                return Err(StoreError::EmptyStore);
            }
            Ok(batch)
        })
    }

    /// Read up to `n` samples starting at logical sequence number `offset`
    ///
    /// Returns samples for `offset, offset + 1, ...` in ascending order,
    /// clipped at the total count. Fails with
    /// [`StoreError::OffsetOutOfRange`] when `offset` was never assigned and
    /// with [`StoreError::StaleOffset`] when the requested window starts
    /// below `count - capacity`: those slots have been overwritten by newer
    /// sequence numbers and returning their current occupants would silently
    /// hand back the wrong samples.
    pub fn get_sequential_batch(&self, n: usize, offset: u64) -> Result<Vec<Sample>> {
        self.with_db(|db| {
            let read_txn = db.begin_read()?;
            let meta = read_txn.open_table(META_TABLE)?;
            let total = read_count(&meta)?;

            if offset >= total {
                return Err(StoreError::OffsetOutOfRange { offset, total });
            }
            let oldest_live = total.saturating_sub(self.config.capacity);
            if offset < oldest_live {
                return Err(StoreError::StaleOffset { offset, oldest_live });
            }

            let end = total.min(offset.saturating_add(n as u64));
            let observations = read_txn.open_table(OBSERVATIONS_TABLE)?;
            let mut batch = Vec::with_capacity((end - offset) as usize);
            for seq in offset..end {
                let slot = slot_of(seq, self.config.capacity);
                if let Some(sample) = self.read_slot(&observations, slot)? {
                    batch.push(sample);
                }
            }
            Ok(batch)
        })
    }

    /// Erase all slot records and reset the counter to 0
    ///
    /// Atomic: failure leaves the store completely unchanged.
    pub fn clear(&self) -> Result<()> {
        self.with_db(|db| {
            let write_txn = db.begin_write()?;
            write_txn.delete_table(OBSERVATIONS_TABLE)?;
            {
                let _ = write_txn.open_table(OBSERVATIONS_TABLE)?;
                let mut meta = write_txn.open_table(META_TABLE)?;
                meta.insert(COUNT_KEY, 0u64.to_be_bytes().as_slice())?;
            }
            write_txn.commit()?;
            tracing::info!("Cleared replay store");
            Ok(())
        })
    }

    /// Statistics snapshot
    pub fn stats(&self) -> Result<StoreStats> {
        let total = self.count_samples()?;
        Ok(StoreStats {
            total,
            actual_size: total.min(self.config.capacity),
            capacity: self.config.capacity,
            wrapped: total > self.config.capacity,
        })
    }

    /// Flush and release the backing file
    ///
    /// Idempotent: a second call is a no-op, never an error. Every other
    /// operation fails with [`StoreError::StoreClosed`] afterwards.
    pub fn close(&self) -> Result<()> {
        let mut guard = self.db.write();
        if let Some(db) = guard.take() {
            // Committed transactions are already durable; dropping the
            // handle releases the file lock.
            drop(db);
            tracing::debug!("Closed replay store");
        }
        Ok(())
    }

    fn with_db<T>(&self, f: impl FnOnce(&Database) -> Result<T>) -> Result<T> {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(StoreError::StoreClosed)?;
        f(db)
    }

    /// Read and decode one slot, treating a missing or corrupt record as
    /// skippable rather than failing the whole batch.
    fn read_slot(
        &self,
        table: &impl ReadableTable<&'static [u8], &'static [u8]>,
        slot: u64,
    ) -> Result<Option<Sample>> {
        let key = slot_key(slot);
        let Some(raw) = table.get(key.as_slice())? else {
            tracing::warn!("Live slot {} has no record, skipping", slot);
            return Ok(None);
        };
        match self.codec.decode(raw.value()) {
            Ok(sample) => Ok(Some(sample)),
            Err(StoreError::CorruptSample(reason)) => {
                tracing::warn!("Skipping corrupt record in slot {}: {}", slot, reason);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
