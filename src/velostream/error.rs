//! Error types for the foreign-key join subsystem
//!
//! Runtime failures surface as [`StreamsError`], build-time wiring failures as
//! [`TopologyError`] (aggregated into a [`TopologyBuildError`] by the streams graph).
//! None of these are retryable: a protocol or configuration mismatch cannot be fixed
//! by trying again.

use crate::velostream::serialization::SerializationError;
use std::fmt;
use thiserror::Error;

/// How an error must be treated by the surrounding engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClassification {
    /// Broken upstream contract; the partition's task must abort
    FatalInvariant,
    /// Peer speaks a protocol revision this build does not understand
    ProtocolIncompatibility,
    /// Misuse of a processor or task lifecycle inside the engine
    Internal,
    /// User configuration cannot be honored; the application must not start
    Configuration,
}

/// Runtime error raised while processing records
#[derive(Debug, Error)]
pub enum StreamsError {
    /// A record reached a processor with an absent key, value or new value
    #[error("{processor} should never see a null {field}")]
    MissingRecordField {
        processor: String,
        field: &'static str,
    },

    /// Envelope written by a newer protocol revision
    #[error("{message_type} is of an incompatible version: {version} (max supported {max_supported})")]
    UnsupportedVersion {
        message_type: &'static str,
        version: u32,
        max_supported: u32,
    },

    /// Instruction code outside the closed instruction set
    #[error("Unknown subscription instruction code: {code}")]
    UnknownInstruction { code: u8 },

    /// Processor asked to process before `init`
    #[error("Processor '{processor}' has not been initialized")]
    NotInitialized { processor: String },

    /// Processor initialized a second time
    #[error("Processor '{processor}' has already been initialized")]
    AlreadyInitialized { processor: String },

    /// Task rejected a record after an earlier fatal error
    #[error("Task {task_id} has failed and cannot process further records: {reason}")]
    TaskFailed { task_id: String, reason: String },

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error(transparent)]
    Topology(#[from] TopologyError),
}

impl StreamsError {
    pub fn missing_field(processor: impl Into<String>, field: &'static str) -> Self {
        Self::MissingRecordField {
            processor: processor.into(),
            field,
        }
    }

    /// Classify this error per the engine's handling policy
    pub fn classification(&self) -> ErrorClassification {
        match self {
            StreamsError::MissingRecordField { .. } | StreamsError::TaskFailed { .. } => {
                ErrorClassification::FatalInvariant
            }
            StreamsError::UnsupportedVersion { .. }
            | StreamsError::UnknownInstruction { .. }
            | StreamsError::Serialization(_) => ErrorClassification::ProtocolIncompatibility,
            StreamsError::NotInitialized { .. } | StreamsError::AlreadyInitialized { .. } => {
                ErrorClassification::Internal
            }
            StreamsError::Topology(_) => ErrorClassification::Configuration,
        }
    }

    /// Always false: retry cannot fix a protocol or configuration mismatch
    pub fn is_retryable(&self) -> bool {
        false
    }
}

/// Error raised while writing a graph node into a topology builder
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error(
        "Store '{store_name}' must be versioned to use a grace period in a stream-table join"
    )]
    UnversionedStore { store_name: String },

    #[error(
        "History retention of store '{store_name}' ({history_retention_ms}ms) must be at least the grace period ({grace_period_ms}ms)"
    )]
    HistoryRetentionTooShort {
        store_name: String,
        grace_period_ms: u128,
        history_retention_ms: u128,
    },

    #[error("Node '{node}' declares unknown parent '{parent}'")]
    UnknownParent { node: String, parent: String },

    #[error("Processor '{processor}' cannot be connected to unknown store '{store_name}'")]
    UnknownStore {
        processor: String,
        store_name: String,
    },

    #[error("Unknown processor '{processor}'")]
    UnknownProcessor { processor: String },

    #[error("Node '{name}' is already registered")]
    DuplicateNode { name: String },

    #[error("State store '{name}' is already registered")]
    DuplicateStore { name: String },
}

/// Every error collected while building a topology from a streams graph
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct TopologyBuildError {
    pub errors: Vec<TopologyError>,
}

impl fmt::Display for TopologyBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Topology construction failed with {} error(s)",
            self.errors.len()
        )?;
        for (i, err) in self.errors.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{}", sep, err)?;
        }
        Ok(())
    }
}
