//! Decay-vertex record store.
//!
//! A lock-protected log of [`DecayVertexRecord`]s shared by every worker via
//! `Arc`. Workers append one record per successful decay; the output stage
//! reads all records and clears the store once per processing cycle.
//!
//! Every record carries the [`CycleId`] it was produced in. The store only
//! accepts records stamped with its current cycle, so a worker still writing
//! for a finished cycle is rejected instead of leaking into the next one.
//! Records are not ordered across workers.

use parking_lot::Mutex;
use tracing::{debug, error};

use rhadron_core::error::RecordStoreError;
use rhadron_core::types::{CycleId, DecayVertexRecord};

#[derive(Debug, Default)]
struct StoreInner {
    cycle: CycleId,
    records: Vec<DecayVertexRecord>,
    rejected: u64,
}

/// Shared transient log of per-decay vertex information.
#[derive(Debug, Default)]
pub struct DecayRecordStore {
    inner: Mutex<StoreInner>,
}

impl DecayRecordStore {
    /// Create an empty store at cycle 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store positioned at `cycle`.
    pub fn starting_at(cycle: CycleId) -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                cycle,
                ..StoreInner::default()
            }),
        }
    }

    /// The cycle whose records are currently accepted.
    pub fn current_cycle(&self) -> CycleId {
        self.inner.lock().cycle
    }

    /// Append one record. Rejects records stamped with any other cycle.
    pub fn append(&self, record: DecayVertexRecord) -> Result<(), RecordStoreError> {
        let mut inner = self.inner.lock();
        if record.cycle != inner.cycle {
            inner.rejected += 1;
            let err = RecordStoreError::StaleCycle {
                track_id: record.parent_track_id,
                record_cycle: record.cycle.0,
                store_cycle: inner.cycle.0,
            };
            error!(%err, "rejected decay record");
            return Err(err);
        }
        inner.records.push(record);
        Ok(())
    }

    /// Copy of every record currently held. Does not remove anything.
    pub fn drain_all(&self) -> Vec<DecayVertexRecord> {
        self.inner.lock().records.clone()
    }

    /// Remove every record. The cycle is left unchanged.
    pub fn clear(&self) {
        self.inner.lock().records.clear();
    }

    /// Take every record of the current cycle and open the next one, under
    /// a single lock acquisition. Returns the records and the new cycle.
    pub fn finish_cycle(&self) -> (Vec<DecayVertexRecord>, CycleId) {
        let mut inner = self.inner.lock();
        let records = std::mem::take(&mut inner.records);
        let finished = inner.cycle;
        inner.cycle = finished.next();
        debug!(%finished, records = records.len(), "closed record cycle");
        (records, inner.cycle)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().records.is_empty()
    }

    /// Number of records rejected for carrying a stale cycle.
    pub fn rejected(&self) -> u64 {
        self.inner.lock().rejected
    }
}
