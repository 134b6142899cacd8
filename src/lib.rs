//! # velostream-fkjoin
//!
//! Foreign-key join subsystem for velostream: lets a primary-keyed stream join a table
//! keyed by a foreign key extracted from each record, with both sides partitioned and
//! updated continuously.
//!
//! ## Features
//!
//! - **Subscription protocol**: versioned [`SubscriptionWrapper`] / [`SubscriptionResponseWrapper`]
//!   envelopes that survive rolling upgrades
//! - **Subscription join processor**: local foreign-table lookup driven by a closed
//!   [`Instruction`] set
//! - **Topology wiring**: [`StreamTableJoinNode`] validates versioned-join grace periods
//!   against store history retention before anything runs
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use velostream_fkjoin::velostream::state::ValueGetterSupplier;
//! use velostream_fkjoin::{
//!     Change, CombinedKey, InMemoryTable, Instruction, PartitionTask, Record,
//!     SubscriptionJoinProcessorSupplier, SubscriptionJoinTask, SubscriptionWrapper, TaskId,
//!     TaskMetadata, ValueAndTimestamp, ValueHash,
//! };
//!
//! let customers: InMemoryTable<String, String> = InMemoryTable::new("customers-store");
//! customers.put("c-1".to_string(), "Alice".to_string(), 100);
//!
//! let getters: Arc<dyn ValueGetterSupplier<String, String>> =
//!     Arc::new(customers.value_getter_supplier());
//! let supplier = SubscriptionJoinProcessorSupplier::new(getters);
//! let mut task: SubscriptionJoinTask<String, String, String> =
//!     PartitionTask::new(&supplier, TaskMetadata::new("app", TaskId::new(0, 0)));
//! task.init().unwrap();
//!
//! let subscription = SubscriptionWrapper::new(
//!     Some(ValueHash::of(b"order-1")),
//!     Instruction::PropagateOnlyIfForeignValueAvailable,
//!     Some("c-1".to_string()),
//!     0,
//! );
//! let out = task
//!     .process(Record::new(
//!         CombinedKey::new("c-1".to_string(), "order-1".to_string()),
//!         Change::insert(ValueAndTimestamp::new(subscription, 50)),
//!         50,
//!     ))
//!     .unwrap();
//!
//! assert_eq!(out[0].key.as_deref(), Some("order-1"));
//! assert_eq!(out[0].timestamp, 100);
//! ```

pub mod velostream;

pub use velostream::error::{ErrorClassification, StreamsError, TopologyBuildError, TopologyError};
pub use velostream::fkjoin::{
    CURRENT_VERSION, CombinedKey, CombinedKeyPartitioner, CombinedKeySerde, Instruction,
    SubscriptionJoinProcessorSupplier, SubscriptionJoinTask, SubscriptionResponseWrapper,
    SubscriptionResponseWrapperSerde, SubscriptionWrapper, SubscriptionWrapperSerde, ValueHash,
};
pub use velostream::processor::{PartitionTask, Record, TaskId, TaskMetadata};
pub use velostream::state::{Change, InMemoryTable, ValueAndTimestamp};
pub use velostream::topology::{
    InternalTopologyBuilder, ProcessorParameters, StoreDescriptor, StreamTableJoinNode,
    StreamsGraph, TopologyBuilder,
};
