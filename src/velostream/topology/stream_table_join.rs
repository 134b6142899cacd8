//! Stream-table join graph node
//!
//! Wires a stream-table (or stream-global-table) join processor into the topology.
//! Joins against a partitioned table also get access to the table's local stores, and
//! when a grace period is configured those stores must be versioned with enough
//! history retention to serve lookups that far back. The check runs while the
//! topology is built, so a bad configuration stops the application before any record
//! is read.

use super::builder::{ProcessorParameters, TopologyBuilder};
use crate::velostream::error::TopologyError;
use log::debug;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct StreamTableJoinNode {
    node_name: String,
    parent_node_names: Vec<String>,
    processor_parameters: ProcessorParameters,
    /// Stores of the joined table; unused for global tables
    store_names: Vec<String>,
    /// Table side of the join; `None` for a global table
    other_join_side_node_name: Option<String>,
    grace_period: Option<Duration>,
}

impl StreamTableJoinNode {
    pub fn new(
        node_name: impl Into<String>,
        processor_parameters: ProcessorParameters,
        store_names: Vec<String>,
        other_join_side_node_name: Option<String>,
        grace_period: Option<Duration>,
    ) -> Self {
        Self {
            node_name: node_name.into(),
            parent_node_names: Vec::new(),
            processor_parameters,
            store_names,
            other_join_side_node_name,
            grace_period,
        }
    }

    pub fn with_parents(mut self, parents: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.parent_node_names = parents.into_iter().map(Into::into).collect();
        self
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    pub fn parent_node_names(&self) -> &[String] {
        &self.parent_node_names
    }

    /// Name the join processor is registered under in the topology
    pub fn processor_name(&self) -> &str {
        self.processor_parameters.processor_name()
    }

    pub fn store_names(&self) -> &[String] {
        &self.store_names
    }

    pub fn grace_period(&self) -> Option<Duration> {
        self.grace_period
    }

    /// Whether the table side is a global table
    pub fn is_global_table_join(&self) -> bool {
        self.other_join_side_node_name.is_none()
    }

    pub fn write_to_topology(&self, builder: &mut dyn TopologyBuilder) -> Result<(), TopologyError> {
        self.write_with_parents(builder, &self.parent_node_names)
    }

    /// Write with parents already resolved to their topology names
    pub(crate) fn write_with_parents(
        &self,
        builder: &mut dyn TopologyBuilder,
        parents: &[String],
    ) -> Result<(), TopologyError> {
        let processor_name = self.processor_parameters.processor_name();

        self.processor_parameters.add_processor_to(builder, parents)?;

        // partitioned table only; global tables are replicated and never validated
        if self.other_join_side_node_name.is_some() {
            builder.connect_processor_and_state_stores(processor_name, &self.store_names)?;
            if let Some(grace_period) = self.grace_period {
                validate_grace_period(&*builder, &self.store_names, grace_period)?;
            }
        }
        debug!("Wrote {} to topology", self);
        Ok(())
    }
}

/// Check every store can serve versioned lookups `grace_period` back in time
pub fn validate_grace_period(
    builder: &dyn TopologyBuilder,
    store_names: &[String],
    grace_period: Duration,
) -> Result<(), TopologyError> {
    for store_name in store_names {
        if !builder.is_store_versioned(store_name) {
            return Err(TopologyError::UnversionedStore {
                store_name: store_name.clone(),
            });
        }
        let history_retention = builder.history_retention(store_name);
        if grace_period.as_millis() > history_retention.as_millis() {
            return Err(TopologyError::HistoryRetentionTooShort {
                store_name: store_name.clone(),
                grace_period_ms: grace_period.as_millis(),
                history_retention_ms: history_retention.as_millis(),
            });
        }
    }
    Ok(())
}

impl fmt::Display for StreamTableJoinNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StreamTableJoinNode{{nodeName='{}', storeNames={:?}, processorName='{}', otherJoinSideNodeName={:?}, gracePeriod={:?}}}",
            self.node_name,
            self.store_names,
            self.processor_parameters.processor_name(),
            self.other_join_side_node_name,
            self.grace_period
        )
    }
}
