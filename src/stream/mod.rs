//! Stream Module
//!
//! Transport-agnostic byte channels used by instructions and the protocol.
//!
//! ## Contract
//! - `InputStream::read(n)` returns between 0 and `n` bytes. Fewer than
//!   requested means timeout or end-of-data, never an error.
//! - `OutputStream::write(bytes)` writes the whole buffer or fails.
//! - A lost link surfaces as `BridgeError::Transport`; recovering from it is
//!   the job of a [`Transport`], not of the protocol.

mod io;
mod memory;
mod serial;

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;

use crate::error::{BridgeError, Result};

pub use io::{IoInput, IoOutput};
pub use memory::MemoryStream;
pub use serial::{
    PortLink, PortOpener, PortReader, PortWriter, SerialLink, SerialOpener, SerialReader,
    SerialWriter,
};

/// Receiving side of a byte channel
pub trait InputStream {
    /// Read up to `size` bytes
    fn read(&mut self, size: usize) -> Result<Bytes>;
}

/// Sending side of a byte channel
pub trait OutputStream {
    /// Write the full buffer
    fn write(&mut self, data: &[u8]) -> Result<()>;
}

/// Output handle shared between every sender of a protocol
pub type SharedOutput = Arc<Mutex<dyn OutputStream + Send>>;

/// Wrap an output stream so it can be handed to a protocol
pub fn shared_output<O>(output: O) -> SharedOutput
where
    O: OutputStream + Send + 'static,
{
    Arc::new(Mutex::new(output))
}

/// Connection lifecycle of a concrete link
pub trait Transport: Send + Sync {
    /// One attempt to rediscover and reopen the link
    fn reconnect(&self) -> Result<()>;

    /// Close the link. Reads and writes fail until the next reconnect.
    fn close(&self);

    fn is_connected(&self) -> bool;

    /// Human readable endpoint for logs
    fn describe(&self) -> String;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn reconnect(&self) -> Result<()> {
        (**self).reconnect()
    }

    fn close(&self) {
        (**self).close()
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

// =============================================================================
// Blanket implementations
// =============================================================================

impl InputStream for &[u8] {
    fn read(&mut self, size: usize) -> Result<Bytes> {
        let n = size.min(self.len());
        let (head, tail) = self.split_at(n);
        *self = tail;
        Ok(Bytes::copy_from_slice(head))
    }
}

impl<T: InputStream + ?Sized> InputStream for &mut T {
    fn read(&mut self, size: usize) -> Result<Bytes> {
        (**self).read(size)
    }
}

impl<T: InputStream + ?Sized> InputStream for Box<T> {
    fn read(&mut self, size: usize) -> Result<Bytes> {
        (**self).read(size)
    }
}

impl OutputStream for Vec<u8> {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.extend_from_slice(data);
        Ok(())
    }
}

impl<T: OutputStream + ?Sized> OutputStream for &mut T {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        (**self).write(data)
    }
}

impl<T: OutputStream + ?Sized> OutputStream for Box<T> {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        (**self).write(data)
    }
}

// =============================================================================
// Read helpers
// =============================================================================

/// Largest request handed to a stream in one `read` call
pub const READ_CHUNK: usize = 4096;

/// Read until `size` bytes arrived or the stream returns nothing
///
/// Requests go out in chunks of at most [`READ_CHUNK`] bytes, so a bogus
/// declared length costs no more than the bytes that actually arrive. The
/// result is shorter than `size` only when the stream ran dry.
pub fn read_up_to(input: &mut dyn InputStream, size: usize) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(size.min(READ_CHUNK));

    while buf.len() < size {
        let chunk = input.read((size - buf.len()).min(READ_CHUNK))?;
        if chunk.is_empty() {
            break;
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(buf.freeze())
}

/// Read exactly `size` bytes, failing with a decode error on a short read
pub fn read_exact(input: &mut dyn InputStream, size: usize) -> Result<Bytes> {
    let bytes = read_up_to(input, size)?;
    if bytes.len() < size {
        return Err(BridgeError::Decode {
            expected: size,
            actual: bytes.len(),
        });
    }
    Ok(bytes)
}
