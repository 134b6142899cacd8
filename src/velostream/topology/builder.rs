//! Topology construction capability
//!
//! Graph nodes write themselves into a [`TopologyBuilder`]. The
//! [`InternalTopologyBuilder`] records sources, processors, state stores and which
//! processors may access which stores, and answers store versioning questions during
//! build-time validation.

use crate::velostream::error::TopologyError;
use log::debug;
use std::any::Any;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Kind of a registered state store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// Latest value per key only
    KeyValue,
    /// Answers point-in-time lookups back to `history_retention`
    Versioned { history_retention: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreDescriptor {
    pub name: String,
    pub kind: StoreKind,
}

impl StoreDescriptor {
    pub fn key_value(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: StoreKind::KeyValue,
        }
    }

    pub fn versioned(name: impl Into<String>, history_retention: Duration) -> Self {
        Self {
            name: name.into(),
            kind: StoreKind::Versioned { history_retention },
        }
    }
}

/// Type-erased processor supplier registered under a processor name
pub type ErasedSupplier = Arc<dyn Any + Send + Sync>;

/// Builder contract used by graph nodes
pub trait TopologyBuilder {
    fn add_source(&mut self, name: &str, topics: &[String]) -> Result<(), TopologyError>;

    fn add_processor(
        &mut self,
        name: &str,
        supplier: ErasedSupplier,
        parents: &[String],
    ) -> Result<(), TopologyError>;

    fn add_state_store(&mut self, store: StoreDescriptor) -> Result<(), TopologyError>;

    fn connect_processor_and_state_stores(
        &mut self,
        processor_name: &str,
        store_names: &[String],
    ) -> Result<(), TopologyError>;

    /// False for unknown stores
    fn is_store_versioned(&self, store_name: &str) -> bool;

    /// Zero for unknown or unversioned stores
    fn history_retention(&self, store_name: &str) -> Duration;
}

/// Processor name plus the supplier that creates its instances
#[derive(Clone)]
pub struct ProcessorParameters {
    processor_name: String,
    supplier: ErasedSupplier,
}

impl ProcessorParameters {
    pub fn new<S>(processor_name: impl Into<String>, supplier: S) -> Self
    where
        S: Any + Send + Sync,
    {
        Self {
            processor_name: processor_name.into(),
            supplier: Arc::new(supplier),
        }
    }

    pub fn processor_name(&self) -> &str {
        &self.processor_name
    }

    pub fn add_processor_to(
        &self,
        builder: &mut dyn TopologyBuilder,
        parent_node_names: &[String],
    ) -> Result<(), TopologyError> {
        builder.add_processor(
            &self.processor_name,
            Arc::clone(&self.supplier),
            parent_node_names,
        )
    }
}

impl fmt::Debug for ProcessorParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessorParameters")
            .field("processor_name", &self.processor_name)
            .finish_non_exhaustive()
    }
}

enum NodeKind {
    Source { topics: Vec<String> },
    Processor { supplier: ErasedSupplier },
}

struct TopologyNode {
    name: String,
    parents: Vec<String>,
    kind: NodeKind,
    stores: BTreeSet<String>,
}

/// In-memory [`TopologyBuilder`]
#[derive(Default)]
pub struct InternalTopologyBuilder {
    nodes: Vec<TopologyNode>,
    index: HashMap<String, usize>,
    stores: HashMap<String, StoreDescriptor>,
}

impl InternalTopologyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&mut self, node: TopologyNode) -> Result<(), TopologyError> {
        if self.index.contains_key(&node.name) {
            return Err(TopologyError::DuplicateNode { name: node.name });
        }
        if let Some(parent) = node.parents.iter().find(|p| !self.index.contains_key(*p)) {
            return Err(TopologyError::UnknownParent {
                node: node.name.clone(),
                parent: parent.clone(),
            });
        }
        self.index.insert(node.name.clone(), self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    fn node(&self, name: &str) -> Option<&TopologyNode> {
        self.index.get(name).map(|&i| &self.nodes[i])
    }

    pub fn contains_node(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Node names in registration order
    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.name.as_str()).collect()
    }

    pub fn parents(&self, name: &str) -> Option<&[String]> {
        self.node(name).map(|n| n.parents.as_slice())
    }

    /// Stores a processor has been connected to
    pub fn connected_stores(&self, processor_name: &str) -> Option<&BTreeSet<String>> {
        self.node(processor_name).map(|n| &n.stores)
    }

    pub fn store(&self, store_name: &str) -> Option<&StoreDescriptor> {
        self.stores.get(store_name)
    }

    /// Typed supplier registered for a processor
    pub fn processor_supplier<S>(&self, processor_name: &str) -> Option<Arc<S>>
    where
        S: Any + Send + Sync,
    {
        match &self.node(processor_name)?.kind {
            NodeKind::Processor { supplier } => Arc::clone(supplier).downcast::<S>().ok(),
            NodeKind::Source { .. } => None,
        }
    }

    /// Human-readable listing of nodes, their parents and connected stores
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            match &node.kind {
                NodeKind::Source { topics } => {
                    out.push_str(&format!("Source: {} (topics: {:?})\n", node.name, topics));
                }
                NodeKind::Processor { .. } => {
                    out.push_str(&format!(
                        "Processor: {} (stores: {:?}) <-- {}\n",
                        node.name,
                        node.stores,
                        node.parents.join(", ")
                    ));
                }
            }
        }
        out
    }
}

impl fmt::Debug for InternalTopologyBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InternalTopologyBuilder")
            .field("nodes", &self.node_names())
            .field("stores", &self.stores.keys().collect::<BTreeSet<_>>())
            .finish()
    }
}

impl TopologyBuilder for InternalTopologyBuilder {
    fn add_source(&mut self, name: &str, topics: &[String]) -> Result<(), TopologyError> {
        self.register(TopologyNode {
            name: name.to_string(),
            parents: Vec::new(),
            kind: NodeKind::Source {
                topics: topics.to_vec(),
            },
            stores: BTreeSet::new(),
        })?;
        debug!("Added source '{}' for topics {:?}", name, topics);
        Ok(())
    }

    fn add_processor(
        &mut self,
        name: &str,
        supplier: ErasedSupplier,
        parents: &[String],
    ) -> Result<(), TopologyError> {
        self.register(TopologyNode {
            name: name.to_string(),
            parents: parents.to_vec(),
            kind: NodeKind::Processor { supplier },
            stores: BTreeSet::new(),
        })?;
        debug!("Added processor '{}' with parents {:?}", name, parents);
        Ok(())
    }

    fn add_state_store(&mut self, store: StoreDescriptor) -> Result<(), TopologyError> {
        if self.stores.contains_key(&store.name) {
            return Err(TopologyError::DuplicateStore { name: store.name });
        }
        debug!("Added state store '{}' ({:?})", store.name, store.kind);
        self.stores.insert(store.name.clone(), store);
        Ok(())
    }

    fn connect_processor_and_state_stores(
        &mut self,
        processor_name: &str,
        store_names: &[String],
    ) -> Result<(), TopologyError> {
        let idx = match self.index.get(processor_name) {
            Some(&idx) if matches!(self.nodes[idx].kind, NodeKind::Processor { .. }) => idx,
            _ => {
                return Err(TopologyError::UnknownProcessor {
                    processor: processor_name.to_string(),
                });
            }
        };
        if let Some(missing) = store_names.iter().find(|s| !self.stores.contains_key(*s)) {
            return Err(TopologyError::UnknownStore {
                processor: processor_name.to_string(),
                store_name: missing.clone(),
            });
        }
        self.nodes[idx].stores.extend(store_names.iter().cloned());
        Ok(())
    }

    fn is_store_versioned(&self, store_name: &str) -> bool {
        matches!(
            self.stores.get(store_name).map(|s| s.kind),
            Some(StoreKind::Versioned { .. })
        )
    }

    fn history_retention(&self, store_name: &str) -> Duration {
        match self.stores.get(store_name).map(|s| s.kind) {
            Some(StoreKind::Versioned { history_retention }) => history_retention,
            _ => Duration::ZERO,
        }
    }
}
