//! Primitive serializers
//!
//! Fixed-width integers and floats with an explicit byte order.

use std::fmt;
use std::marker::PhantomData;

use bytes::{BufMut, Bytes, BytesMut};

use super::{IntegerCodec, Serializer};
use crate::error::{BridgeError, Result};
use crate::stream::{read_exact, InputStream};

/// Byte order of a primitive field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

mod sealed {
    pub trait Sealed {}
}

/// A fixed-width numeric type
///
/// Sealed: implemented for the built-in integers and floats only.
pub trait Scalar: sealed::Sealed + Copy + PartialEq + fmt::Debug + Send + Sync + 'static {
    const WIDTH: usize;
    const NAME: &'static str;

    fn put(self, order: ByteOrder, buf: &mut BytesMut);

    /// Decode from the first `WIDTH` bytes, `None` when the slice is shorter
    fn get(bytes: &[u8], order: ByteOrder) -> Option<Self>;
}

/// A scalar that can carry an index or a length
pub trait Integer: Scalar {
    fn from_index(index: usize) -> Option<Self>;
    fn to_index(self) -> Option<usize>;
}

macro_rules! impl_scalar {
    ($($t:ty => $name:literal),* $(,)?) => {$(
        impl sealed::Sealed for $t {}

        impl Scalar for $t {
            const WIDTH: usize = std::mem::size_of::<$t>();
            const NAME: &'static str = $name;

            fn put(self, order: ByteOrder, buf: &mut BytesMut) {
                match order {
                    ByteOrder::Little => buf.put_slice(&self.to_le_bytes()),
                    ByteOrder::Big => buf.put_slice(&self.to_be_bytes()),
                }
            }

            fn get(bytes: &[u8], order: ByteOrder) -> Option<Self> {
                let raw: [u8; std::mem::size_of::<$t>()] =
                    bytes.get(..Self::WIDTH)?.try_into().ok()?;
                Some(match order {
                    ByteOrder::Little => <$t>::from_le_bytes(raw),
                    ByteOrder::Big => <$t>::from_be_bytes(raw),
                })
            }
        }
    )*};
}

macro_rules! impl_integer {
    ($($t:ty),* $(,)?) => {$(
        impl Integer for $t {
            fn from_index(index: usize) -> Option<Self> {
                <$t>::try_from(index).ok()
            }

            fn to_index(self) -> Option<usize> {
                usize::try_from(self).ok()
            }
        }
    )*};
}

impl_scalar! {
    u8 => "u8", i8 => "i8",
    u16 => "u16", i16 => "i16",
    u32 => "u32", i32 => "i32",
    u64 => "u64", i64 => "i64",
    f32 => "f32", f64 => "f64",
}

impl_integer!(u8, i8, u16, i16, u32, i32, u64, i64);

/// Serializer for a single scalar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Primitive<T> {
    order: ByteOrder,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Primitive<T> {
    pub const fn new(order: ByteOrder) -> Self {
        Self {
            order,
            _marker: PhantomData,
        }
    }

    pub const fn little() -> Self {
        Self::new(ByteOrder::Little)
    }

    pub const fn big() -> Self {
        Self::new(ByteOrder::Big)
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }
}

pub const U8: Primitive<u8> = Primitive::little();
pub const I8: Primitive<i8> = Primitive::little();
pub const U16: Primitive<u16> = Primitive::little();
pub const I16: Primitive<i16> = Primitive::little();
pub const U32: Primitive<u32> = Primitive::little();
pub const I32: Primitive<i32> = Primitive::little();
pub const U64: Primitive<u64> = Primitive::little();
pub const I64: Primitive<i64> = Primitive::little();
pub const F32: Primitive<f32> = Primitive::little();
pub const F64: Primitive<f64> = Primitive::little();

impl<T: Scalar> Serializer for Primitive<T> {
    type Value = T;

    fn size(&self) -> Option<usize> {
        Some(T::WIDTH)
    }

    fn pack_into(&self, value: &T, buf: &mut BytesMut) -> Result<()> {
        value.put(self.order, buf);
        Ok(())
    }

    fn unpack(&self, input: &mut dyn InputStream) -> Result<T> {
        let bytes = read_exact(input, T::WIDTH)?;
        T::get(&bytes, self.order).ok_or(BridgeError::Decode {
            expected: T::WIDTH,
            actual: bytes.len(),
        })
    }
}

impl<T: Integer> IntegerCodec for Primitive<T> {
    fn width(&self) -> usize {
        T::WIDTH
    }

    fn encode_index(&self, index: usize) -> Result<Bytes> {
        let value = T::from_index(index).ok_or(BridgeError::OpcodeOverflow {
            index,
            width: T::WIDTH,
        })?;
        self.pack(&value)
    }

    fn decode_index(&self, input: &mut dyn InputStream) -> Result<usize> {
        let value = self.unpack(input)?;
        value
            .to_index()
            .ok_or_else(|| BridgeError::Malformed(format!("negative {}: {:?}", T::NAME, value)))
    }
}

impl<T: Scalar> fmt::Display for Primitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.order {
            ByteOrder::Little => write!(f, "{}", T::NAME),
            ByteOrder::Big => write!(f, "{}be", T::NAME),
        }
    }
}
