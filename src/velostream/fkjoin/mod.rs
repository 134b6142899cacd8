//! Foreign-key join subscription protocol
//!
//! A foreign-key join lets a primary-keyed stream join a table keyed differently.
//! The primary side extracts a foreign key per record and sends a
//! [`SubscriptionWrapper`] keyed by [`CombinedKey`] across a shuffle to the partition
//! that owns that foreign key. There, the [`SubscriptionJoinProcessor`] reads the
//! local table and answers with a [`SubscriptionResponseWrapper`] keyed by the primary
//! key, which shuffles back to the origin partition for correlation.
//!
//! ```text
//! extraction ──(fk, pk) shuffle──▶ SubscriptionJoinProcessor ──pk shuffle──▶ correlation
//!                                        │
//!                                  local table lookup
//! ```
//!
//! Results are eventually consistent: the response carries the hash of the primary
//! value it was computed for, so stale responses can be recognised and dropped.

pub mod combined_key;
pub mod hash;
pub mod instruction;
pub mod processor;
pub mod response;
pub mod subscription;

pub use combined_key::{
    CombinedKey, CombinedKeyPartitioner, CombinedKeySerde, partition_for_key_bytes,
};
pub use hash::ValueHash;
pub use instruction::Instruction;
pub use processor::{
    ResponseRecord, SubscriptionJoinMetrics, SubscriptionJoinProcessor,
    SubscriptionJoinProcessorSupplier, SubscriptionJoinTask, SubscriptionRecord,
};
pub use response::{
    RESPONSE_CURRENT_VERSION, SubscriptionResponseWrapper, SubscriptionResponseWrapperSerde,
};
pub use subscription::{
    CURRENT_VERSION, SubscriptionWrapper, SubscriptionWrapperSerde, UNKNOWN_PARTITION, VERSION_0,
};
