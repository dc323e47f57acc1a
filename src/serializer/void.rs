//! Void serializer
//!
//! Zero-length payload for signal-only messages.

use std::fmt;

use bytes::BytesMut;

use super::Serializer;
use crate::error::Result;
use crate::stream::InputStream;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Void;

impl Serializer for Void {
    type Value = ();

    fn size(&self) -> Option<usize> {
        Some(0)
    }

    fn pack_into(&self, _value: &(), _buf: &mut BytesMut) -> Result<()> {
        Ok(())
    }

    fn unpack(&self, _input: &mut dyn InputStream) -> Result<()> {
        Ok(())
    }
}

impl fmt::Display for Void {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("void")
    }
}
