//! Adapters over `std::io`
//!
//! Lets any `Read`/`Write` (TCP sockets, pipes, files) carry the protocol.

use std::io::{ErrorKind, Read, Write};

use bytes::Bytes;

use super::{InputStream, OutputStream};
use crate::error::{BridgeError, Result};

/// Input side over a `std::io::Read`
pub struct IoInput<R> {
    reader: R,
}

impl<R: Read> IoInput<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> InputStream for IoInput<R> {
    fn read(&mut self, size: usize) -> Result<Bytes> {
        let mut buf = vec![0u8; size];
        match Read::read(&mut self.reader, &mut buf) {
            Ok(n) => {
                buf.truncate(n);
                Ok(Bytes::from(buf))
            }
            Err(e) if is_short_read(e.kind()) => Ok(Bytes::new()),
            Err(e) => Err(BridgeError::Transport(e.to_string())),
        }
    }
}

/// Output side over a `std::io::Write`
pub struct IoOutput<W> {
    writer: W,
}

impl<W: Write> IoOutput<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutputStream for IoOutput<W> {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.writer
            .write_all(data)
            .and_then(|_| self.writer.flush())
            .map_err(|e| BridgeError::Transport(e.to_string()))
    }
}

/// Timeouts surface as `WouldBlock` on Unix and `TimedOut` on Windows
pub(crate) fn is_short_read(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
    )
}
