//! State lookup capability consumed by join processors
//!
//! Processors never own a store. They receive a [`ValueGetterSupplier`] at build time
//! and obtain one [`ValueGetter`] per processor instance, bound to the partition the
//! instance runs on.

pub mod in_memory;

pub use in_memory::{InMemoryTable, InMemoryValueGetter, InMemoryValueGetterSupplier};

use crate::velostream::error::StreamsError;
use crate::velostream::processor::TaskMetadata;

/// A value together with the timestamp of the update that produced it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValueAndTimestamp<V> {
    pub value: V,
    /// Milliseconds since epoch
    pub timestamp: i64,
}

impl<V> ValueAndTimestamp<V> {
    pub fn new(value: V, timestamp: i64) -> Self {
        Self { value, timestamp }
    }
}

/// Old and new value of a table update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change<T> {
    pub new_value: Option<T>,
    pub old_value: Option<T>,
}

impl<T> Change<T> {
    pub fn new(new_value: Option<T>, old_value: Option<T>) -> Self {
        Self {
            new_value,
            old_value,
        }
    }

    /// Change with only a new value
    pub fn insert(new_value: T) -> Self {
        Self {
            new_value: Some(new_value),
            old_value: None,
        }
    }
}

/// Point lookups against the local partition of a table
pub trait ValueGetter<K, V>: Send {
    /// Bind the getter to the task it runs in; called exactly once before `get`
    fn init(&mut self, task: &TaskMetadata) -> Result<(), StreamsError>;

    fn get(&self, key: &K) -> Option<ValueAndTimestamp<V>>;

    fn close(&mut self) {}
}

/// Creates one [`ValueGetter`] per processor instance
pub trait ValueGetterSupplier<K, V>: Send + Sync {
    fn get(&self) -> Box<dyn ValueGetter<K, V>>;

    /// Names of the state stores the getters read from
    fn store_names(&self) -> Vec<String>;
}
