//! Build-time topology wiring
//!
//! - `builder`: the topology construction capability and its in-memory implementation
//! - `graph`: graph node kinds and the streams graph that writes them out
//! - `stream_table_join`: stream-table join node with grace period validation

pub mod builder;
pub mod graph;
pub mod stream_table_join;

pub use builder::{
    ErasedSupplier, InternalTopologyBuilder, ProcessorParameters, StoreDescriptor, StoreKind,
    TopologyBuilder,
};
pub use graph::{
    GraphNode, ProcessorGraphNode, SourceNode, StreamsGraph, StreamsGraphNode, TableSourceNode,
};
pub use stream_table_join::{StreamTableJoinNode, validate_grace_period};
