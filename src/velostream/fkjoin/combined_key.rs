//! Combined (foreign key, primary key) subscription key
//!
//! Subscriptions are re-keyed by [`CombinedKey`] before the shuffle. Partitioning looks
//! only at the foreign key, so a subscription lands on the same partition number as the
//! foreign table row it has to read.

use crate::velostream::serialization::{ByteReader, Serde, SerializationError};
use std::marker::PhantomData;
use xxhash_rust::xxh3::xxh3_64;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CombinedKey<F, P> {
    pub foreign_key: F,
    pub primary_key: P,
}

impl<F, P> CombinedKey<F, P> {
    pub fn new(foreign_key: F, primary_key: P) -> Self {
        Self {
            foreign_key,
            primary_key,
        }
    }

    /// Split into (foreign key, primary key)
    pub fn into_parts(self) -> (F, P) {
        (self.foreign_key, self.primary_key)
    }
}

/// Wire format: `[i32 BE foreign key length][foreign key][primary key]`
pub struct CombinedKeySerde<F, P, FS, PS> {
    foreign_serde: FS,
    primary_serde: PS,
    _marker: PhantomData<fn() -> (F, P)>,
}

impl<F, P, FS, PS> CombinedKeySerde<F, P, FS, PS>
where
    FS: Serde<F>,
    PS: Serde<P>,
{
    pub fn new(foreign_serde: FS, primary_serde: PS) -> Self {
        Self {
            foreign_serde,
            primary_serde,
            _marker: PhantomData,
        }
    }

    /// Leading bytes shared by every combined key with this foreign key
    pub fn prefix(&self, foreign_key: &F) -> Result<Vec<u8>, SerializationError> {
        let fk = self.foreign_serde.serialize(foreign_key)?;
        let mut out = Vec::with_capacity(4 + fk.len());
        write_length_prefixed(&mut out, &fk)?;
        Ok(out)
    }
}

fn write_length_prefixed(out: &mut Vec<u8>, bytes: &[u8]) -> Result<(), SerializationError> {
    let len = i32::try_from(bytes.len()).map_err(|_| {
        SerializationError::SerializationFailed(format!(
            "foreign key of {} bytes exceeds the maximum length",
            bytes.len()
        ))
    })?;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(bytes);
    Ok(())
}

impl<F, P, FS, PS> Serde<CombinedKey<F, P>> for CombinedKeySerde<F, P, FS, PS>
where
    FS: Serde<F>,
    PS: Serde<P>,
{
    fn serialize(&self, key: &CombinedKey<F, P>) -> Result<Vec<u8>, SerializationError> {
        let fk = self.foreign_serde.serialize(&key.foreign_key)?;
        let pk = self.primary_serde.serialize(&key.primary_key)?;
        let mut out = Vec::with_capacity(4 + fk.len() + pk.len());
        write_length_prefixed(&mut out, &fk)?;
        out.extend_from_slice(&pk);
        Ok(out)
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<CombinedKey<F, P>, SerializationError> {
        let mut reader = ByteReader::new(bytes);
        let len = reader.read_i32("combined key foreign key length")?;
        let len = usize::try_from(len).map_err(|_| {
            SerializationError::InvalidData(format!("negative foreign key length {}", len))
        })?;
        let foreign_key = self
            .foreign_serde
            .deserialize(reader.read_bytes(len, "combined key foreign key")?)?;
        let primary_key = self.primary_serde.deserialize(reader.rest())?;
        Ok(CombinedKey::new(foreign_key, primary_key))
    }
}

/// Partition for a serialized key
pub fn partition_for_key_bytes(key_bytes: &[u8], num_partitions: u32) -> i32 {
    if num_partitions == 0 {
        return 0;
    }
    (xxh3_64(key_bytes) % u64::from(num_partitions)) as i32
}

/// Routes combined keys by their foreign key only
pub struct CombinedKeyPartitioner<F, FS> {
    foreign_serde: FS,
    num_partitions: u32,
    _marker: PhantomData<fn() -> F>,
}

impl<F, FS: Serde<F>> CombinedKeyPartitioner<F, FS> {
    pub fn new(foreign_serde: FS, num_partitions: u32) -> Self {
        Self {
            foreign_serde,
            num_partitions,
            _marker: PhantomData,
        }
    }

    pub fn num_partitions(&self) -> u32 {
        self.num_partitions
    }

    pub fn partition<P>(&self, key: &CombinedKey<F, P>) -> Result<i32, SerializationError> {
        self.partition_for_foreign_key(&key.foreign_key)
    }

    /// Partition of the foreign table row keyed by `foreign_key`
    pub fn partition_for_foreign_key(&self, foreign_key: &F) -> Result<i32, SerializationError> {
        let bytes = self.foreign_serde.serialize(foreign_key)?;
        Ok(partition_for_key_bytes(&bytes, self.num_partitions))
    }
}
