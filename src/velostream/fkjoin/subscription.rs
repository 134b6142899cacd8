//! Subscription envelope sent from the primary side to the foreign side
//!
//! ## Wire format
//!
//! ```text
//! byte 0      version (bits 0-5) | 0x80 hash absent | 0x40 foreign key absent
//! byte 1      instruction code
//! 16 bytes    primary value hash (omitted when absent)
//! 4 bytes     primary partition, i32 BE (version >= 1)
//! rest        serialized foreign key (omitted when absent)
//! ```
//!
//! The version byte lets binaries of different revisions coexist during a rolling
//! upgrade. A reader must reject any version newer than [`CURRENT_VERSION`].

use super::hash::{VALUE_HASH_LEN, ValueHash};
use super::instruction::Instruction;
use crate::velostream::error::StreamsError;
use crate::velostream::serialization::{ByteReader, Serde, SerializationError};
use std::marker::PhantomData;

/// Newest subscription envelope revision this build understands
pub const CURRENT_VERSION: u32 = 1;

/// Revision without the primary partition field
pub const VERSION_0: u32 = 0;

/// Primary partition of a version 0 envelope, which did not record it
pub const UNKNOWN_PARTITION: i32 = -1;

pub(crate) const HASH_ABSENT_FLAG: u8 = 0x80;
pub(crate) const PAYLOAD_ABSENT_FLAG: u8 = 0x40;
pub(crate) const VERSION_MASK: u8 = 0x3f;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionWrapper<F> {
    pub version: u32,
    pub primary_value_hash: Option<ValueHash>,
    pub instruction: Instruction,
    pub foreign_key: Option<F>,
    pub primary_partition: i32,
}

impl<F> SubscriptionWrapper<F> {
    /// Envelope at [`CURRENT_VERSION`]
    pub fn new(
        primary_value_hash: Option<ValueHash>,
        instruction: Instruction,
        foreign_key: Option<F>,
        primary_partition: i32,
    ) -> Self {
        Self {
            version: CURRENT_VERSION,
            primary_value_hash,
            instruction,
            foreign_key,
            primary_partition,
        }
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Fail unless this build understands the envelope's revision
    pub fn check_version(&self) -> Result<(), StreamsError> {
        check_version("SubscriptionWrapper", self.version, CURRENT_VERSION)
    }
}

pub(crate) fn check_version(
    message_type: &'static str,
    version: u32,
    max_supported: u32,
) -> Result<(), StreamsError> {
    if version > max_supported {
        return Err(StreamsError::UnsupportedVersion {
            message_type,
            version,
            max_supported,
        });
    }
    Ok(())
}

pub(crate) fn encode_version_byte(
    version: u32,
    hash_absent: bool,
    payload_absent: bool,
) -> Result<u8, SerializationError> {
    let mut byte = u8::try_from(version)
        .ok()
        .filter(|v| v & !VERSION_MASK == 0)
        .ok_or_else(|| {
            SerializationError::SerializationFailed(format!(
                "version {} does not fit the envelope version field",
                version
            ))
        })?;
    if hash_absent {
        byte |= HASH_ABSENT_FLAG;
    }
    if payload_absent {
        byte |= PAYLOAD_ABSENT_FLAG;
    }
    Ok(byte)
}

/// Binary codec for [`SubscriptionWrapper`]
pub struct SubscriptionWrapperSerde<F, FS> {
    foreign_serde: FS,
    _marker: PhantomData<fn() -> F>,
}

impl<F, FS: Serde<F>> SubscriptionWrapperSerde<F, FS> {
    pub fn new(foreign_serde: FS) -> Self {
        Self {
            foreign_serde,
            _marker: PhantomData,
        }
    }

    /// Encode an envelope; revisions newer than [`CURRENT_VERSION`] are refused
    pub fn encode(&self, wrapper: &SubscriptionWrapper<F>) -> Result<Vec<u8>, StreamsError> {
        wrapper.check_version()?;
        let version_byte = encode_version_byte(
            wrapper.version,
            wrapper.primary_value_hash.is_none(),
            wrapper.foreign_key.is_none(),
        )?;

        let mut out = Vec::with_capacity(2 + VALUE_HASH_LEN + 4);
        out.push(version_byte);
        out.push(wrapper.instruction.code());
        if let Some(hash) = &wrapper.primary_value_hash {
            out.extend_from_slice(hash.as_bytes());
        }
        if wrapper.version >= 1 {
            out.extend_from_slice(&wrapper.primary_partition.to_be_bytes());
        }
        if let Some(fk) = &wrapper.foreign_key {
            out.extend_from_slice(&self.foreign_serde.serialize(fk)?);
        }
        Ok(out)
    }

    /// Decode an envelope, rejecting revisions newer than [`CURRENT_VERSION`]
    pub fn decode(&self, bytes: &[u8]) -> Result<SubscriptionWrapper<F>, StreamsError> {
        let mut reader = ByteReader::new(bytes);
        let flags = reader.read_u8("subscription version")?;
        let version = u32::from(flags & VERSION_MASK);
        check_version("SubscriptionWrapper", version, CURRENT_VERSION)?;

        let instruction = Instruction::try_from(reader.read_u8("subscription instruction")?)?;
        let primary_value_hash = if flags & HASH_ABSENT_FLAG == 0 {
            Some(ValueHash::from_bytes(
                reader.read_array::<VALUE_HASH_LEN>("subscription hash")?,
            ))
        } else {
            None
        };
        let primary_partition = if version >= 1 {
            reader.read_i32("subscription primary partition")?
        } else {
            UNKNOWN_PARTITION
        };
        let foreign_key = if flags & PAYLOAD_ABSENT_FLAG == 0 {
            Some(self.foreign_serde.deserialize(reader.rest())?)
        } else {
            None
        };

        Ok(SubscriptionWrapper {
            version,
            primary_value_hash,
            instruction,
            foreign_key,
            primary_partition,
        })
    }
}
