//! In-memory stream
//!
//! A cloneable byte queue implementing both stream sides. Two streams built
//! by [`MemoryStream::pair`] form a loopback link between two endpoints.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::{Buf, Bytes, BytesMut};
use parking_lot::Mutex;

use super::{InputStream, OutputStream, Transport};
use crate::error::{BridgeError, Result};

/// In-process stream backed by shared buffers
#[derive(Clone)]
pub struct MemoryStream {
    /// Bytes waiting to be read
    incoming: Arc<Mutex<BytesMut>>,

    /// Bytes written by this side
    outgoing: Arc<Mutex<BytesMut>>,

    /// Cleared by `close`, set by `reconnect`
    connected: Arc<AtomicBool>,

    /// Number of successful reconnects
    reconnects: Arc<AtomicUsize>,
}

impl MemoryStream {
    /// Create a standalone stream: feed its input, inspect its output
    pub fn new() -> Self {
        Self {
            incoming: Arc::new(Mutex::new(BytesMut::new())),
            outgoing: Arc::new(Mutex::new(BytesMut::new())),
            connected: Arc::new(AtomicBool::new(true)),
            reconnects: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create two crossed streams: what one writes, the other reads
    pub fn pair() -> (Self, Self) {
        let a = Self::new();
        let b = Self {
            incoming: Arc::clone(&a.outgoing),
            outgoing: Arc::clone(&a.incoming),
            connected: Arc::clone(&a.connected),
            reconnects: Arc::new(AtomicUsize::new(0)),
        };
        (a, b)
    }

    /// Append bytes to the input side
    pub fn feed(&self, data: &[u8]) {
        self.incoming.lock().extend_from_slice(data);
    }

    /// Bytes still waiting to be read
    pub fn remaining(&self) -> usize {
        self.incoming.lock().len()
    }

    /// Drain everything written so far
    pub fn take_written(&self) -> Bytes {
        self.outgoing.lock().split().freeze()
    }

    pub fn reconnect_count(&self) -> usize {
        self.reconnects.load(Ordering::Acquire)
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.connected.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(BridgeError::Transport("memory stream closed".to_string()))
        }
    }
}

impl Default for MemoryStream {
    fn default() -> Self {
        Self::new()
    }
}

impl InputStream for MemoryStream {
    fn read(&mut self, size: usize) -> Result<Bytes> {
        self.ensure_connected()?;
        let mut incoming = self.incoming.lock();
        let n = size.min(incoming.len());
        Ok(incoming.copy_to_bytes(n))
    }
}

impl OutputStream for MemoryStream {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.ensure_connected()?;
        self.outgoing.lock().extend_from_slice(data);
        Ok(())
    }
}

impl Transport for MemoryStream {
    fn reconnect(&self) -> Result<()> {
        self.connected.store(true, Ordering::Release);
        self.reconnects.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn close(&self) {
        self.connected.store(false, Ordering::Release);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
