//! Instruction
//!
//! An opcode bound to a serializer and an optional display name.
//!
//! ## Wire Format
//! ```text
//! ┌──────────────────┬──────────────────────────────┐
//! │ Opcode (N bytes) │ Payload (serializer-defined) │
//! └──────────────────┴──────────────────────────────┘
//! ```

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::Result;
use crate::serializer::Serializer;
use crate::stream::{InputStream, OutputStream};

/// Type-erased description of an instruction, for manifests and diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionInfo {
    code: Bytes,
    name: Option<String>,
    signature: String,
    payload_size: Option<usize>,
}

impl InstructionInfo {
    /// Opcode bytes
    pub fn code(&self) -> &Bytes {
        &self.code
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Serializer signature, e.g. `(u8, u8)` or `u8[u16]`
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Payload size, `None` for variable-size payloads
    pub fn payload_size(&self) -> Option<usize> {
        self.payload_size
    }
}

impl fmt::Display for InstructionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in self.code.iter() {
            write!(f, "{:02x}", byte)?;
        }
        write!(
            f,
            " {}: {}",
            self.name.as_deref().unwrap_or("<anonymous>"),
            self.signature
        )
    }
}

/// Opcode + serializer. Immutable after construction.
#[derive(Debug, Clone)]
pub struct Instruction<S> {
    info: InstructionInfo,
    serializer: S,
}

impl<S: Serializer> Instruction<S> {
    pub fn new(code: Bytes, serializer: S, name: Option<String>) -> Self {
        let info = InstructionInfo {
            code,
            name,
            signature: serializer.to_string(),
            payload_size: serializer.size(),
        };
        Self { info, serializer }
    }

    pub fn info(&self) -> &InstructionInfo {
        &self.info
    }

    pub fn code(&self) -> &Bytes {
        &self.info.code
    }

    pub fn name(&self) -> Option<&str> {
        self.info.name()
    }

    pub fn serializer(&self) -> &S {
        &self.serializer
    }

    /// Write opcode and payload as one write
    pub fn send(&self, output: &mut dyn OutputStream, value: &S::Value) -> Result<()> {
        let code = &self.info.code;
        let mut buf = BytesMut::with_capacity(code.len() + self.info.payload_size.unwrap_or(0));
        buf.put_slice(code);
        self.serializer.pack_into(value, &mut buf)?;
        output.write(&buf)
    }

    /// Decode the payload; the opcode has already been consumed
    pub fn receive(&self, input: &mut dyn InputStream) -> Result<S::Value> {
        self.serializer.unpack(input)
    }
}

impl<S> fmt::Display for Instruction<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.info, f)
    }
}
