//! Record-at-a-time processor API
//!
//! A [`Processor`] consumes one [`Record`] at a time and emits zero or more records
//! through its [`ProcessorContext`]. Processors are created per partition by a
//! [`ProcessorSupplier`] and driven by a [`PartitionTask`].

pub mod context;
pub mod task;

pub use context::{ProcessorContext, RecordingContext, TaskId, TaskMetadata};
pub use task::PartitionTask;

use crate::velostream::error::StreamsError;

/// Keyed, timestamped record flowing between processors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<K, V> {
    pub key: Option<K>,
    pub value: Option<V>,
    /// Milliseconds since epoch
    pub timestamp: i64,
}

impl<K, V> Record<K, V> {
    pub fn new(key: K, value: V, timestamp: i64) -> Self {
        Self {
            key: Some(key),
            value: Some(value),
            timestamp,
        }
    }

    /// Copy of this record with a different key
    pub fn with_key<NewK>(self, key: NewK) -> Record<NewK, V> {
        Record {
            key: Some(key),
            value: self.value,
            timestamp: self.timestamp,
        }
    }

    /// Copy of this record with a different value
    pub fn with_value<NewV>(self, value: NewV) -> Record<K, NewV> {
        Record {
            key: self.key,
            value: Some(value),
            timestamp: self.timestamp,
        }
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Stateful per-partition record processor
pub trait Processor<KIn, VIn, KOut, VOut>: Send {
    /// Called once before the first record
    fn init(
        &mut self,
        _context: &mut dyn ProcessorContext<KOut, VOut>,
    ) -> Result<(), StreamsError> {
        Ok(())
    }

    fn process(
        &mut self,
        record: Record<KIn, VIn>,
        context: &mut dyn ProcessorContext<KOut, VOut>,
    ) -> Result<(), StreamsError>;

    fn close(&mut self) {}
}

/// Factory for processor instances, one per partition
pub trait ProcessorSupplier<KIn, VIn, KOut, VOut>: Send + Sync {
    fn get(&self) -> Box<dyn Processor<KIn, VIn, KOut, VOut>>;

    /// State stores the created processors need access to
    fn store_names(&self) -> Vec<String> {
        Vec::new()
    }
}
