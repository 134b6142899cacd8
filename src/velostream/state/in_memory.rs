//! In-memory lookup table
//!
//! Holds the latest value per key for one table partition. The writer side keeps an
//! [`InMemoryTable`] handle; join processors read through value getters created by
//! [`InMemoryTable::value_getter_supplier`].

use super::{ValueAndTimestamp, ValueGetter, ValueGetterSupplier};
use crate::velostream::error::StreamsError;
use crate::velostream::processor::TaskMetadata;
use log::debug;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

type Entries<K, V> = Arc<RwLock<HashMap<K, ValueAndTimestamp<V>>>>;

/// Shared in-memory table of `K -> ValueAndTimestamp<V>`
#[derive(Debug)]
pub struct InMemoryTable<K, V> {
    name: String,
    entries: Entries<K, V>,
}

impl<K, V> Clone for InMemoryTable<K, V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<K, V> InMemoryTable<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert or replace the value for `key`, returning the previous one
    pub fn put(&self, key: K, value: V, timestamp: i64) -> Option<ValueAndTimestamp<V>> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key, ValueAndTimestamp::new(value, timestamp))
    }

    pub fn delete(&self, key: &K) -> Option<ValueAndTimestamp<V>> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn value_getter_supplier(&self) -> InMemoryValueGetterSupplier<K, V> {
        InMemoryValueGetterSupplier {
            table: self.clone(),
        }
    }
}

/// Supplies getters reading from one [`InMemoryTable`]
#[derive(Debug, Clone)]
pub struct InMemoryValueGetterSupplier<K, V> {
    table: InMemoryTable<K, V>,
}

impl<K, V> ValueGetterSupplier<K, V> for InMemoryValueGetterSupplier<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self) -> Box<dyn ValueGetter<K, V>> {
        Box::new(InMemoryValueGetter {
            store_name: self.table.name.clone(),
            entries: Arc::clone(&self.table.entries),
            task: None,
        })
    }

    fn store_names(&self) -> Vec<String> {
        vec![self.table.name.clone()]
    }
}

/// Read-only view over an [`InMemoryTable`]
#[derive(Debug)]
pub struct InMemoryValueGetter<K, V> {
    store_name: String,
    entries: Entries<K, V>,
    task: Option<TaskMetadata>,
}

impl<K, V> InMemoryValueGetter<K, V> {
    /// Task this getter was bound to, if initialized
    pub fn task(&self) -> Option<&TaskMetadata> {
        self.task.as_ref()
    }
}

impl<K, V> ValueGetter<K, V> for InMemoryValueGetter<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    fn init(&mut self, task: &TaskMetadata) -> Result<(), StreamsError> {
        debug!(
            "Binding value getter for store '{}' to task {}",
            self.store_name, task.task_id
        );
        self.task = Some(task.clone());
        Ok(())
    }

    fn get(&self, key: &K) -> Option<ValueAndTimestamp<V>> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }
}
