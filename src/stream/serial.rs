//! Serial port transport
//!
//! One physical port, two independent handles: a blocking read on the
//! reader never holds up the writer. Both handles share the link, so a
//! fault on either side marks the whole link down and a reconnect swaps the
//! port under both of them.
//!
//! [`PortLink`] holds the lifecycle; a [`PortOpener`] knows how to find and
//! open the device. [`SerialLink`] is the link over real serial ports.

use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use serialport::{ClearBuffer, SerialPort};

use super::io::is_short_read;
use super::{InputStream, OutputStream, Transport};
use crate::config::Config;
use crate::error::{BridgeError, Result};

/// Finds and opens the device behind a [`PortLink`]
pub trait PortOpener: Send + Sync + 'static {
    type Port: Read + Write + Send;

    /// Open a device: its name, a reading handle and a writing handle
    fn open(&self) -> Result<(String, Self::Port, Self::Port)>;

    /// Pause between closing the old port and opening a new one
    fn settle_delay(&self) -> Duration {
        Duration::ZERO
    }
}

/// A port with connect/reconnect/close lifecycle
pub struct PortLink<O: PortOpener> {
    opener: O,

    /// Device currently (or last) in use
    port_name: RwLock<String>,

    /// Handle used by the polling side
    reader: Mutex<Option<O::Port>>,

    /// Handle used by senders
    writer: Mutex<Option<O::Port>>,

    connected: AtomicBool,
}

impl<O: PortOpener> PortLink<O> {
    /// Open the first device `opener` finds
    pub fn with_opener(opener: O) -> Result<Arc<Self>> {
        let (port_name, reader, writer) = opener.open()?;

        Ok(Arc::new(Self {
            opener,
            port_name: RwLock::new(port_name),
            reader: Mutex::new(Some(reader)),
            writer: Mutex::new(Some(writer)),
            connected: AtomicBool::new(true),
        }))
    }

    /// Input handle for a protocol
    pub fn reader(self: &Arc<Self>) -> PortReader<O> {
        PortReader {
            link: Arc::clone(self),
        }
    }

    /// Output handle for a protocol
    pub fn writer(self: &Arc<Self>) -> PortWriter<O> {
        PortWriter {
            link: Arc::clone(self),
        }
    }

    pub fn port_name(&self) -> String {
        self.port_name.read().clone()
    }

    pub fn opener(&self) -> &O {
        &self.opener
    }

    fn fault(&self, e: impl std::fmt::Display) -> BridgeError {
        self.connected.store(false, Ordering::Release);
        BridgeError::Transport(e.to_string())
    }

    fn closed() -> BridgeError {
        BridgeError::Transport("connection closed".to_string())
    }
}

impl<O: PortOpener> Transport for PortLink<O> {
    fn reconnect(&self) -> Result<()> {
        self.close();
        thread::sleep(self.opener.settle_delay());

        let (name, reader, writer) = self.opener.open()?;

        *self.reader.lock() = Some(reader);
        *self.writer.lock() = Some(writer);
        *self.port_name.write() = name.clone();
        self.connected.store(true, Ordering::Release);

        tracing::info!("Reconnected to {}", name);
        Ok(())
    }

    fn close(&self) {
        let reader = self.reader.lock().take();
        let writer = self.writer.lock().take();
        if reader.is_some() || writer.is_some() {
            tracing::debug!("Closed {}", self.port_name());
        }
        self.connected.store(false, Ordering::Release);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn describe(&self) -> String {
        format!("PortLink<{}>", self.port_name())
    }
}

/// Reading half of a [`PortLink`]
pub struct PortReader<O: PortOpener> {
    link: Arc<PortLink<O>>,
}

impl<O: PortOpener> InputStream for PortReader<O> {
    fn read(&mut self, size: usize) -> Result<Bytes> {
        // A writer fault downs the whole link; the poll loop must see it
        if !self.link.is_connected() {
            return Err(PortLink::<O>::closed());
        }

        let mut guard = self.link.reader.lock();
        let port = guard.as_mut().ok_or_else(PortLink::<O>::closed)?;

        let mut buf = vec![0u8; size];
        match Read::read(port, &mut buf) {
            Ok(n) => {
                buf.truncate(n);
                Ok(Bytes::from(buf))
            }
            Err(e) if is_short_read(e.kind()) => Ok(Bytes::new()),
            Err(e) => {
                guard.take();
                Err(self.link.fault(e))
            }
        }
    }
}

/// Writing half of a [`PortLink`]
pub struct PortWriter<O: PortOpener> {
    link: Arc<PortLink<O>>,
}

impl<O: PortOpener> OutputStream for PortWriter<O> {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        if !self.link.is_connected() {
            return Err(PortLink::<O>::closed());
        }

        let mut guard = self.link.writer.lock();
        let port = guard.as_mut().ok_or_else(PortLink::<O>::closed)?;

        if let Err(e) = port.write_all(data).and_then(|_| port.flush()) {
            guard.take();
            return Err(self.link.fault(e));
        }
        Ok(())
    }
}

// =============================================================================
// Serial ports
// =============================================================================

/// Link over a physical serial port
pub type SerialLink = PortLink<SerialOpener>;
pub type SerialReader = PortReader<SerialOpener>;
pub type SerialWriter = PortWriter<SerialOpener>;

/// Discovers and opens serial devices per [`Config`]
pub struct SerialOpener {
    config: Config,
}

impl SerialOpener {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Configured port, otherwise the first discovered one
    fn pick_port(&self) -> Result<String> {
        if let Some(port) = &self.config.port {
            return Ok(port.clone());
        }

        let candidates = SerialLink::discover(&self.config)?;
        tracing::debug!("Discovered ports {:?}", candidates);

        candidates
            .into_iter()
            .next()
            .ok_or_else(|| BridgeError::Transport("no serial ports found".to_string()))
    }

    /// Drop buffered bytes left over from a previous session
    fn discard_stale(port: &mut Box<dyn SerialPort>) -> Result<()> {
        port.clear(ClearBuffer::All)?;
        let pending = port.bytes_to_read()? as usize;
        if pending > 0 {
            let mut sink = vec![0u8; pending];
            match Read::read(port, &mut sink) {
                Ok(n) => tracing::debug!("Discarded {} stale bytes", n),
                Err(e) if is_short_read(e.kind()) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

impl PortOpener for SerialOpener {
    type Port = Box<dyn SerialPort>;

    fn open(&self) -> Result<(String, Self::Port, Self::Port)> {
        let name = self.pick_port()?;
        let mut reader = serialport::new(&name, self.config.baud_rate)
            .timeout(self.config.read_timeout())
            .open()?;
        Self::discard_stale(&mut reader)?;
        let writer = reader.try_clone()?;

        tracing::info!("Opened {} at {} baud", name, self.config.baud_rate);
        Ok((name, reader, writer))
    }

    fn settle_delay(&self) -> Duration {
        self.config.settle_delay()
    }
}

impl SerialLink {
    /// Discover a serial device and open it
    pub fn open(config: Config) -> Result<Arc<Self>> {
        Self::with_opener(SerialOpener::new(config))
    }

    /// Enumerate serial devices, skipping the denylisted names
    pub fn search_ports(denylist: &[String]) -> Result<Vec<String>> {
        let ports = serialport::available_ports()?;
        Ok(ports
            .into_iter()
            .map(|p| p.port_name)
            .filter(|name| !denylist.iter().any(|d| d == name))
            .collect())
    }

    /// Devices eligible under the configured denylist and filter
    pub fn discover(config: &Config) -> Result<Vec<String>> {
        let ports = Self::search_ports(&config.port_denylist)?;
        Ok(match &config.port_filter {
            Some(filter) => ports.into_iter().filter(|p| p.contains(filter.as_str())).collect(),
            None => ports,
        })
    }
}
