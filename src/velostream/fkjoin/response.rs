//! Response envelope sent from the foreign side back to the primary partition
//!
//! Same framing as the subscription envelope, without the instruction byte:
//! version/flags byte, optional 16-byte hash, i32 BE partition (version >= 1), then
//! the serialized foreign value when present.

use super::hash::{VALUE_HASH_LEN, ValueHash};
use super::subscription::{
    HASH_ABSENT_FLAG, PAYLOAD_ABSENT_FLAG, UNKNOWN_PARTITION, VERSION_MASK, check_version,
    encode_version_byte,
};
use crate::velostream::error::StreamsError;
use crate::velostream::serialization::{ByteReader, Serde};
use std::marker::PhantomData;

/// Newest response envelope revision this build understands
pub const RESPONSE_CURRENT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionResponseWrapper<V> {
    pub primary_value_hash: Option<ValueHash>,
    pub foreign_value: Option<V>,
    pub primary_partition: i32,
}

impl<V> SubscriptionResponseWrapper<V> {
    pub fn new(
        primary_value_hash: Option<ValueHash>,
        foreign_value: Option<V>,
        primary_partition: i32,
    ) -> Self {
        Self {
            primary_value_hash,
            foreign_value,
            primary_partition,
        }
    }
}

/// Binary codec for [`SubscriptionResponseWrapper`]
pub struct SubscriptionResponseWrapperSerde<V, VS> {
    value_serde: VS,
    _marker: PhantomData<fn() -> V>,
}

impl<V, VS: Serde<V>> SubscriptionResponseWrapperSerde<V, VS> {
    pub fn new(value_serde: VS) -> Self {
        Self {
            value_serde,
            _marker: PhantomData,
        }
    }

    pub fn encode(
        &self,
        response: &SubscriptionResponseWrapper<V>,
    ) -> Result<Vec<u8>, StreamsError> {
        let version_byte = encode_version_byte(
            RESPONSE_CURRENT_VERSION,
            response.primary_value_hash.is_none(),
            response.foreign_value.is_none(),
        )?;

        let mut out = Vec::with_capacity(1 + VALUE_HASH_LEN + 4);
        out.push(version_byte);
        if let Some(hash) = &response.primary_value_hash {
            out.extend_from_slice(hash.as_bytes());
        }
        out.extend_from_slice(&response.primary_partition.to_be_bytes());
        if let Some(value) = &response.foreign_value {
            out.extend_from_slice(&self.value_serde.serialize(value)?);
        }
        Ok(out)
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<SubscriptionResponseWrapper<V>, StreamsError> {
        let mut reader = ByteReader::new(bytes);
        let flags = reader.read_u8("response version")?;
        let version = u32::from(flags & VERSION_MASK);
        check_version(
            "SubscriptionResponseWrapper",
            version,
            RESPONSE_CURRENT_VERSION,
        )?;

        let primary_value_hash = if flags & HASH_ABSENT_FLAG == 0 {
            Some(ValueHash::from_bytes(
                reader.read_array::<VALUE_HASH_LEN>("response hash")?,
            ))
        } else {
            None
        };
        let primary_partition = if version >= 1 {
            reader.read_i32("response primary partition")?
        } else {
            UNKNOWN_PARTITION
        };
        let foreign_value = if flags & PAYLOAD_ABSENT_FLAG == 0 {
            Some(self.value_serde.deserialize(reader.rest())?)
        } else {
            None
        };

        Ok(SubscriptionResponseWrapper {
            primary_value_hash,
            foreign_value,
            primary_partition,
        })
    }
}
