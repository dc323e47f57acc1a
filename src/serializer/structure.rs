//! Struct serializer
//!
//! An ordered tuple of member serializers encoded back to back.

use std::fmt;

use bytes::BytesMut;

use super::Serializer;
use crate::error::Result;
use crate::stream::InputStream;

/// Serializer over a tuple of member serializers, e.g. `Struct((U8, U8))`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Struct<T>(pub T);

impl<T> Struct<T> {
    pub fn new(members: T) -> Self {
        Self(members)
    }
}

macro_rules! impl_struct {
    ($($s:ident . $idx:tt),+) => {
        impl<$($s: Serializer),+> Serializer for Struct<($($s,)+)> {
            type Value = ($(<$s as Serializer>::Value,)+);

            // Fixed only if every member is
            fn size(&self) -> Option<usize> {
                let mut total = 0;
                $( total += self.0.$idx.size()?; )+
                Some(total)
            }

            fn pack_into(&self, value: &Self::Value, buf: &mut BytesMut) -> Result<()> {
                $( self.0.$idx.pack_into(&value.$idx, buf)?; )+
                Ok(())
            }

            fn unpack(&self, input: &mut dyn InputStream) -> Result<Self::Value> {
                Ok(($( self.0.$idx.unpack(input)?, )+))
            }
        }

        impl<$($s: Serializer),+> fmt::Display for Struct<($($s,)+)> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let members = [$( self.0.$idx.to_string() ),+];
                write!(f, "({})", members.join(", "))
            }
        }
    };
}

impl_struct!(A.0);
impl_struct!(A.0, B.1);
impl_struct!(A.0, B.1, C.2);
impl_struct!(A.0, B.1, C.2, D.3);
impl_struct!(A.0, B.1, C.2, D.3, E.4);
impl_struct!(A.0, B.1, C.2, D.3, E.4, F.5);
impl_struct!(A.0, B.1, C.2, D.3, E.4, F.5, G.6);
impl_struct!(A.0, B.1, C.2, D.3, E.4, F.5, G.6, H.7);
