//! Serializer Module
//!
//! Codecs turning typed values into payload bytes and back.
//!
//! ## Variants
//! ```text
//! ┌────────────────┬──────────────┬──────────────────────────────────┐
//! │ Serializer     │ Size         │ Wire                             │
//! ├────────────────┼──────────────┼──────────────────────────────────┤
//! │ Primitive<T>   │ width of T   │ T in the configured byte order   │
//! │ Struct<(A,..)> │ sum or none  │ members back to back             │
//! │ Void           │ 0            │ nothing                          │
//! │ ByteVector<L>  │ variable     │ length (L) + raw bytes           │
//! └────────────────┴──────────────┴──────────────────────────────────┘
//! ```
//!
//! Decoding consumes exactly what encoding produced and never reads ahead.

mod bytevector;
mod primitive;
mod structure;
mod void;

use std::fmt;

use bytes::{Bytes, BytesMut};

use crate::error::{BridgeError, Result};
use crate::stream::InputStream;

pub use bytevector::{ByteVector, MAX_VECTOR_LEN};
pub use primitive::{
    ByteOrder, Integer, Primitive, Scalar, F32, F64, I16, I32, I64, I8, U16, U32, U64, U8,
};
pub use structure::Struct;
pub use void::Void;

/// Encode/decode contract for one value type
pub trait Serializer: fmt::Display + Send + Sync + 'static {
    /// Decoded value
    type Value: Send + 'static;

    /// Encoded size in bytes, `None` when it depends on the value
    fn size(&self) -> Option<usize>;

    /// Append the encoding of `value` to `buf`
    fn pack_into(&self, value: &Self::Value, buf: &mut BytesMut) -> Result<()>;

    /// Decode one value, consuming exactly its encoding
    fn unpack(&self, input: &mut dyn InputStream) -> Result<Self::Value>;

    /// Encode `value` into a fresh buffer
    fn pack(&self, value: &Self::Value) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(self.size().unwrap_or(0));
        self.pack_into(value, &mut buf)?;
        Ok(buf.freeze())
    }

    /// Decode a value that must span the whole slice
    fn unpack_from(&self, bytes: &[u8]) -> Result<Self::Value> {
        let mut input = bytes;
        let value = self.unpack(&mut input)?;
        if !input.is_empty() {
            return Err(BridgeError::Malformed(format!(
                "{} trailing bytes after {}",
                input.len(),
                self
            )));
        }
        Ok(value)
    }
}

/// Integer codec usable for opcodes and length fields
///
/// Object safe, so a protocol can hold differently typed codecs for its two
/// opcode namespaces.
pub trait IntegerCodec: fmt::Display + Send + Sync {
    /// Encoded width in bytes
    fn width(&self) -> usize;

    /// Encode a non-negative index
    fn encode_index(&self, index: usize) -> Result<Bytes>;

    /// Decode a non-negative index
    fn decode_index(&self, input: &mut dyn InputStream) -> Result<usize>;
}
