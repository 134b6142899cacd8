//! Key/value serialization used by the join envelopes
//!
//! Envelope codecs are generic over a [`Serde`] for the embedded keys and values,
//! so the same wire framing works for any key or value format.

use thiserror::Error;

/// Serialization failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializationError {
    /// Input ended before a complete field could be read
    #[error("Truncated {context}: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        context: &'static str,
        needed: usize,
        remaining: usize,
    },

    /// Bytes were read but do not form a valid value
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Value cannot be expressed in the wire format
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),
}

/// Converts values to and from bytes
pub trait Serde<T>: Send + Sync {
    fn serialize(&self, value: &T) -> Result<Vec<u8>, SerializationError>;

    fn deserialize(&self, bytes: &[u8]) -> Result<T, SerializationError>;
}

/// UTF-8 strings
#[derive(Debug, Clone, Copy, Default)]
pub struct StringSerde;

impl Serde<String> for StringSerde {
    fn serialize(&self, value: &String) -> Result<Vec<u8>, SerializationError> {
        Ok(value.as_bytes().to_vec())
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<String, SerializationError> {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| SerializationError::InvalidData(format!("invalid UTF-8 string: {}", e)))
    }
}

/// Raw bytes, passed through unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesSerde;

impl Serde<Vec<u8>> for BytesSerde {
    fn serialize(&self, value: &Vec<u8>) -> Result<Vec<u8>, SerializationError> {
        Ok(value.clone())
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Vec<u8>, SerializationError> {
        Ok(bytes.to_vec())
    }
}

/// Big-endian 64-bit integers
#[derive(Debug, Clone, Copy, Default)]
pub struct I64Serde;

impl Serde<i64> for I64Serde {
    fn serialize(&self, value: &i64) -> Result<Vec<u8>, SerializationError> {
        Ok(value.to_be_bytes().to_vec())
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<i64, SerializationError> {
        let raw: [u8; 8] = bytes.try_into().map_err(|_| {
            SerializationError::InvalidData(format!(
                "expected 8 bytes for i64, got {}",
                bytes.len()
            ))
        })?;
        Ok(i64::from_be_bytes(raw))
    }
}

/// Cursor over an input buffer that reports truncation instead of panicking
pub(crate) struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub(crate) fn read_u8(&mut self, context: &'static str) -> Result<u8, SerializationError> {
        Ok(self.read_bytes(1, context)?[0])
    }

    pub(crate) fn read_i32(&mut self, context: &'static str) -> Result<i32, SerializationError> {
        let raw = self.read_array::<4>(context)?;
        Ok(i32::from_be_bytes(raw))
    }

    pub(crate) fn read_array<const N: usize>(
        &mut self,
        context: &'static str,
    ) -> Result<[u8; N], SerializationError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N, context)?);
        Ok(out)
    }

    pub(crate) fn read_bytes(
        &mut self,
        len: usize,
        context: &'static str,
    ) -> Result<&'a [u8], SerializationError> {
        if self.remaining() < len {
            return Err(SerializationError::Truncated {
                context,
                needed: len,
                remaining: self.remaining(),
            });
        }
        let start = self.pos;
        self.pos += len;
        Ok(&self.buf[start..self.pos])
    }

    /// Everything not yet consumed
    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let start = self.pos;
        self.pos = self.buf.len();
        &self.buf[start..]
    }
}
