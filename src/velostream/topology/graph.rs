//! Logical streams graph
//!
//! The graph is assembled from a closed set of node kinds and written into a
//! [`TopologyBuilder`] in insertion order. Every node is written even after a failure,
//! so all construction errors are reported together before anything runs.
//!
//! Parents are named by graph node name. A node whose processor is registered under a
//! different name (a stream-table join) is resolved to that name when its children
//! are written.

use super::builder::{InternalTopologyBuilder, ProcessorParameters, StoreDescriptor, TopologyBuilder};
use super::stream_table_join::StreamTableJoinNode;
use crate::velostream::error::{TopologyBuildError, TopologyError};
use log::{error, info};
use std::collections::HashMap;

/// Capability shared by every graph node
pub trait GraphNode {
    fn node_name(&self) -> &str;

    fn parent_node_names(&self) -> &[String];

    /// Name this node is registered under in the topology
    fn topology_name(&self) -> &str {
        self.node_name()
    }

    fn write_to_topology(&self, builder: &mut dyn TopologyBuilder) -> Result<(), TopologyError>;
}

/// Reads a stream from topics
#[derive(Debug, Clone)]
pub struct SourceNode {
    pub name: String,
    pub topics: Vec<String>,
}

/// Reads a table from a topic and materializes it into a store
#[derive(Debug, Clone)]
pub struct TableSourceNode {
    pub name: String,
    pub topic: String,
    pub store: StoreDescriptor,
}

/// Plain processor with no store requirements
#[derive(Debug, Clone)]
pub struct ProcessorGraphNode {
    pub parents: Vec<String>,
    pub processor_parameters: ProcessorParameters,
}

#[derive(Debug, Clone)]
pub enum StreamsGraphNode {
    Source(SourceNode),
    TableSource(TableSourceNode),
    Processor(ProcessorGraphNode),
    StreamTableJoin(StreamTableJoinNode),
}

impl GraphNode for StreamsGraphNode {
    fn node_name(&self) -> &str {
        match self {
            StreamsGraphNode::Source(node) => &node.name,
            StreamsGraphNode::TableSource(node) => &node.name,
            StreamsGraphNode::Processor(node) => node.processor_parameters.processor_name(),
            StreamsGraphNode::StreamTableJoin(node) => node.node_name(),
        }
    }

    fn parent_node_names(&self) -> &[String] {
        match self {
            StreamsGraphNode::Source(_) | StreamsGraphNode::TableSource(_) => &[],
            StreamsGraphNode::Processor(node) => &node.parents,
            StreamsGraphNode::StreamTableJoin(node) => node.parent_node_names(),
        }
    }

    fn topology_name(&self) -> &str {
        match self {
            StreamsGraphNode::StreamTableJoin(node) => node.processor_name(),
            _ => self.node_name(),
        }
    }

    fn write_to_topology(&self, builder: &mut dyn TopologyBuilder) -> Result<(), TopologyError> {
        self.write_with_parents(builder, self.parent_node_names())
    }
}

impl StreamsGraphNode {
    fn write_with_parents(
        &self,
        builder: &mut dyn TopologyBuilder,
        parents: &[String],
    ) -> Result<(), TopologyError> {
        match self {
            StreamsGraphNode::Source(node) => builder.add_source(&node.name, &node.topics),
            StreamsGraphNode::TableSource(node) => {
                builder.add_source(&node.name, std::slice::from_ref(&node.topic))?;
                builder.add_state_store(node.store.clone())
            }
            StreamsGraphNode::Processor(node) => {
                node.processor_parameters.add_processor_to(builder, parents)
            }
            StreamsGraphNode::StreamTableJoin(node) => node.write_with_parents(builder, parents),
        }
    }
}

impl From<SourceNode> for StreamsGraphNode {
    fn from(node: SourceNode) -> Self {
        StreamsGraphNode::Source(node)
    }
}

impl From<TableSourceNode> for StreamsGraphNode {
    fn from(node: TableSourceNode) -> Self {
        StreamsGraphNode::TableSource(node)
    }
}

impl From<ProcessorGraphNode> for StreamsGraphNode {
    fn from(node: ProcessorGraphNode) -> Self {
        StreamsGraphNode::Processor(node)
    }
}

impl From<StreamTableJoinNode> for StreamsGraphNode {
    fn from(node: StreamTableJoinNode) -> Self {
        StreamsGraphNode::StreamTableJoin(node)
    }
}

/// Ordered set of graph nodes
#[derive(Debug, Default)]
pub struct StreamsGraph {
    nodes: Vec<StreamsGraphNode>,
    /// Graph node name to topology name
    topology_names: HashMap<String, String>,
}

impl StreamsGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node; its parents must already be in the graph
    pub fn add_node(&mut self, node: impl Into<StreamsGraphNode>) -> Result<(), TopologyError> {
        let node = node.into();
        let name = node.node_name().to_string();
        let topology_name = node.topology_name().to_string();
        for candidate in [&name, &topology_name] {
            let taken = self.topology_names.contains_key(candidate)
                || self.topology_names.values().any(|t| t == candidate);
            if taken {
                return Err(TopologyError::DuplicateNode {
                    name: candidate.clone(),
                });
            }
        }
        if let Some(parent) = node
            .parent_node_names()
            .iter()
            .find(|p| !self.topology_names.contains_key(*p))
        {
            return Err(TopologyError::UnknownParent {
                node: name,
                parent: parent.clone(),
            });
        }
        self.topology_names.insert(name, topology_name);
        self.nodes.push(node);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[StreamsGraphNode] {
        &self.nodes
    }

    /// Write every node into `builder`, collecting all failures
    pub fn build_topology(&self, builder: &mut dyn TopologyBuilder) -> Result<(), TopologyBuildError> {
        let mut errors = Vec::new();
        for node in &self.nodes {
            let parents: Vec<String> = node
                .parent_node_names()
                .iter()
                .map(|p| self.topology_names.get(p).unwrap_or(p).clone())
                .collect();
            if let Err(e) = node.write_with_parents(builder, &parents) {
                error!("Failed to write node '{}': {}", node.node_name(), e);
                errors.push(e);
            }
        }
        if errors.is_empty() {
            info!("Built topology with {} node(s)", self.nodes.len());
            Ok(())
        } else {
            Err(TopologyBuildError { errors })
        }
    }

    /// Build into a fresh [`InternalTopologyBuilder`]
    pub fn build(&self) -> Result<InternalTopologyBuilder, TopologyBuildError> {
        let mut builder = InternalTopologyBuilder::new();
        self.build_topology(&mut builder)?;
        Ok(builder)
    }
}
