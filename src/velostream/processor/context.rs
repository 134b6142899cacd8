//! Processor execution context

use super::Record;
use std::fmt;

/// Identifies one partition of one sub-topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId {
    pub subtopology: u32,
    pub partition: i32,
}

impl TaskId {
    pub fn new(subtopology: u32, partition: i32) -> Self {
        Self {
            subtopology,
            partition,
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.subtopology, self.partition)
    }
}

/// Static information about the task a processor runs in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskMetadata {
    pub application_id: String,
    pub task_id: TaskId,
}

impl TaskMetadata {
    pub fn new(application_id: impl Into<String>, task_id: TaskId) -> Self {
        Self {
            application_id: application_id.into(),
            task_id,
        }
    }
}

/// Forwarding capability handed to a processor
pub trait ProcessorContext<KOut, VOut> {
    fn task_metadata(&self) -> &TaskMetadata;

    /// Emit a record to the downstream processors
    fn forward(&mut self, record: Record<KOut, VOut>);
}

/// Context that buffers forwarded records until they are drained
#[derive(Debug)]
pub struct RecordingContext<K, V> {
    metadata: TaskMetadata,
    forwarded: Vec<Record<K, V>>,
}

impl<K, V> RecordingContext<K, V> {
    pub fn new(metadata: TaskMetadata) -> Self {
        Self {
            metadata,
            forwarded: Vec::new(),
        }
    }

    pub fn forwarded(&self) -> &[Record<K, V>] {
        &self.forwarded
    }

    /// Remove and return everything forwarded so far
    pub fn take_forwarded(&mut self) -> Vec<Record<K, V>> {
        std::mem::take(&mut self.forwarded)
    }
}

impl<K, V> ProcessorContext<K, V> for RecordingContext<K, V> {
    fn task_metadata(&self) -> &TaskMetadata {
        &self.metadata
    }

    fn forward(&mut self, record: Record<K, V>) {
        self.forwarded.push(record);
    }
}
