//! Robot Bridge
//!
//! Host side of the robot link, built by composition over a [`Protocol`].
//!
//! ## Messages
//! ```text
//! Host → Robot (senders)            Robot → Host (receivers)
//! 0x00 send_millis_request: void    0x00 millis: u32
//! 0x01 set_manipulator: (u8, u8)    0x01 log: u8[u16]
//! ```
//! `0xFF` in a manipulator field leaves that joint where it is.

use std::sync::Arc;

use crossbeam::channel::{self, Receiver};

use crate::config::Config;
use crate::error::{BridgeError, Result};
use crate::link::PollWorker;
use crate::protocol::{PollOutcome, Protocol, Sender};
use crate::serializer::{ByteVector, Primitive, Struct, Void, U16, U32, U8};
use crate::stream::{shared_output, InputStream, SerialLink, SharedOutput, Transport};

/// Joint value meaning "keep current position"
pub const HOLD: u8 = 0xFF;

/// Something the robot reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RobotEvent {
    /// Board uptime in milliseconds
    Millis(u32),

    /// A log line printed by the firmware
    Log(String),
}

pub struct Robot {
    millis_request: Sender<Void>,
    manipulator: Sender<Struct<(Primitive<u8>, Primitive<u8>)>>,
    events: Receiver<RobotEvent>,
    manifest: String,

    /// Held here until the poll task takes it
    protocol: Option<Protocol>,
    worker: Option<PollWorker>,
    link: Option<Arc<SerialLink>>,
}

impl Robot {
    /// Open a serial link and register the robot messages on it
    pub fn connect(config: &Config) -> Result<Self> {
        let link = SerialLink::open(config.clone())?;
        let mut robot = Self::new(link.reader(), shared_output(link.writer()))?;
        robot.link = Some(link);
        Ok(robot)
    }

    /// Register the robot messages over arbitrary streams
    pub fn new<I>(input: I, output: SharedOutput) -> Result<Self>
    where
        I: InputStream + Send + 'static,
    {
        let (event_tx, events) = channel::unbounded();
        let mut builder = Protocol::builder(input, output, U8, U8);

        // senders

        let millis_request = builder.add_sender(Void, Some("send_millis_request"))?;
        let manipulator = builder.add_sender(Struct((U8, U8)), Some("set_manipulator"))?;

        // receivers

        let tx = event_tx.clone();
        builder.add_receiver(
            U32,
            move |ms: u32| {
                tracing::info!("ms: {}", ms);
                let _ = tx.send(RobotEvent::Millis(ms));
            },
            Some("millis"),
        )?;

        builder.add_receiver(
            ByteVector::new(U16),
            move |data: bytes::Bytes| {
                let text = String::from_utf8_lossy(&data)
                    .trim_end_matches('\n')
                    .to_string();
                tracing::info!("ESP: {}", text);
                let _ = event_tx.send(RobotEvent::Log(text));
            },
            Some("log"),
        )?;

        let protocol = builder.build();
        let manifest = protocol.manifest();
        tracing::info!("{}", manifest);

        Ok(Self {
            millis_request,
            manipulator,
            events,
            manifest,
            protocol: Some(protocol),
            worker: None,
            link: None,
        })
    }

    /// Ask the board for its uptime; the answer arrives as `RobotEvent::Millis`
    pub fn request_millis(&self) -> Result<()> {
        self.millis_request.send(())
    }

    /// Move both manipulator joints; pass [`HOLD`] to leave one alone
    pub fn set_manipulator(&self, first: u8, second: u8) -> Result<()> {
        self.manipulator.send((first, second))
    }

    pub fn events(&self) -> &Receiver<RobotEvent> {
        &self.events
    }

    pub fn manifest(&self) -> &str {
        &self.manifest
    }

    /// Service one incoming message on the caller's thread
    pub fn poll(&mut self) -> Result<PollOutcome> {
        self.protocol
            .as_mut()
            .ok_or_else(|| BridgeError::Config("poll task already running".to_string()))?
            .poll()
    }

    /// Start the background poll task over the serial link opened by `connect`
    pub fn start_poll_task(&mut self, config: &Config) -> Result<()> {
        let link = self
            .link
            .clone()
            .ok_or_else(|| BridgeError::Config("robot has no serial link".to_string()))?;
        self.start_poll_task_with(link, config)
    }

    /// Start the background poll task, recovering faults through `transport`
    pub fn start_poll_task_with<T>(&mut self, transport: T, config: &Config) -> Result<()>
    where
        T: Transport + 'static,
    {
        let protocol = self
            .protocol
            .take()
            .ok_or_else(|| BridgeError::Config("poll task already running".to_string()))?;
        self.worker = Some(PollWorker::spawn(protocol, transport, config)?);
        Ok(())
    }

    pub fn worker(&self) -> Option<&PollWorker> {
        self.worker.as_ref()
    }

    /// Stop the poll task and take the protocol back
    pub fn stop(&mut self) -> Result<()> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        worker.stop();
        let (protocol, result) = worker.join();
        self.protocol = Some(protocol);
        tracing::info!("Shutting down");
        result
    }
}
