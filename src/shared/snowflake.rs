//! Snowflake ID Generator
//!
//! Time-ordered 64-bit ids: 41 bits of milliseconds since the service
//! epoch, 5 bits of machine id, 5 bits of node id, 12 bits of sequence.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Service epoch (2020-01-01T00:00:00.000Z).
const EPOCH_MS: u64 = 1577836800000;

const MACHINE_BITS: u64 = 5;
const NODE_BITS: u64 = 5;
const SEQUENCE_BITS: u64 = 12;
const TIMESTAMP_SHIFT: u64 = MACHINE_BITS + NODE_BITS + SEQUENCE_BITS;

/// Generates unique, roughly time-sortable ids for persisted records.
pub struct SnowflakeGenerator {
    machine_id: u64,
    node_id: u64,
    sequence: AtomicU64,
    last_timestamp: AtomicU64,
}

impl SnowflakeGenerator {
    pub fn new(machine_id: u64, node_id: u64) -> Self {
        Self {
            machine_id: machine_id & ((1 << MACHINE_BITS) - 1),
            node_id: node_id & ((1 << NODE_BITS) - 1),
            sequence: AtomicU64::new(0),
            last_timestamp: AtomicU64::new(0),
        }
    }

    /// Generate the next id.
    pub fn generate(&self) -> i64 {
        let timestamp = Self::now_ms();
        let last = self.last_timestamp.load(Ordering::SeqCst);

        let sequence = if timestamp == last {
            (self.sequence.fetch_add(1, Ordering::SeqCst) + 1) & ((1 << SEQUENCE_BITS) - 1)
        } else {
            self.last_timestamp.store(timestamp, Ordering::SeqCst);
            self.sequence.store(0, Ordering::SeqCst);
            0
        };

        let id = ((timestamp - EPOCH_MS) << TIMESTAMP_SHIFT)
            | (self.machine_id << (NODE_BITS + SEQUENCE_BITS))
            | (self.node_id << SEQUENCE_BITS)
            | sequence;

        id as i64
    }

    fn now_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("System clock before the Unix epoch")
            .as_millis() as u64
    }
}

/// Millisecond timestamp encoded in a snowflake.
pub fn extract_timestamp(snowflake: i64) -> u64 {
    ((snowflake as u64) >> TIMESTAMP_SHIFT) + EPOCH_MS
}
