//! Length-prefixed byte vector
//!
//! ```text
//! ┌──────────────────┬─────────────────────┐
//! │ Length (L width) │ Raw bytes (Length)  │
//! └──────────────────┴─────────────────────┘
//! ```

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use super::{IntegerCodec, Serializer};
use crate::error::{BridgeError, Result};
use crate::stream::{read_exact, InputStream};

/// Largest accepted declared length (16 MB)
pub const MAX_VECTOR_LEN: usize = 16 * 1024 * 1024;

/// Raw bytes behind a length field encoded with `L`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ByteVector<L> {
    length: L,
    limit: usize,
}

impl<L: IntegerCodec> ByteVector<L> {
    pub fn new(length: L) -> Self {
        Self {
            length,
            limit: MAX_VECTOR_LEN,
        }
    }

    /// Reject declared lengths above `limit` when decoding
    pub fn with_limit(length: L, limit: usize) -> Self {
        Self { length, limit }
    }

    /// Width of the length prefix
    pub fn length_width(&self) -> usize {
        self.length.width()
    }
}

impl<L: IntegerCodec + 'static> Serializer for ByteVector<L> {
    type Value = Bytes;

    fn size(&self) -> Option<usize> {
        None
    }

    fn pack_into(&self, value: &Bytes, buf: &mut BytesMut) -> Result<()> {
        let header = self.length.encode_index(value.len()).map_err(|_| {
            BridgeError::Encode(format!(
                "{} bytes do not fit a {}-byte length field",
                value.len(),
                self.length.width()
            ))
        })?;

        buf.reserve(header.len() + value.len());
        buf.put_slice(&header);
        buf.put_slice(value);
        Ok(())
    }

    fn unpack(&self, input: &mut dyn InputStream) -> Result<Bytes> {
        let len = self.length.decode_index(input)?;
        if len > self.limit {
            return Err(BridgeError::Malformed(format!(
                "declared length {} exceeds limit {}",
                len, self.limit
            )));
        }
        read_exact(input, len)
    }
}

impl<L: IntegerCodec> fmt::Display for ByteVector<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u8[{}]", self.length)
    }
}
