//! Protocol engine
//!
//! Registration (`ProtocolBuilder`) and dispatch (`Protocol`).
//!
//! ## Poll Cycle
//! 1. Read up to `width(local codec)` bytes
//! 2. Nothing read → `Idle`
//! 3. Fewer than width → `ShortRead`, the partial opcode is discarded
//! 4. Unknown opcode → `UnknownOpcode`, only the opcode is consumed
//! 5. Otherwise decode the payload and run the handler on this thread
//!
//! Steps 2-4 never raise an error. Decode faults propagate to the caller.

use bytes::Bytes;

use super::registry::ReceiverRegistry;
use super::sender::Sender;
use crate::error::Result;
use crate::instruction::{Instruction, InstructionInfo};
use crate::serializer::{IntegerCodec, Serializer};
use crate::stream::{read_up_to, InputStream, SharedOutput};

/// Result of a single poll cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// No bytes arrived
    Idle,

    /// An incomplete opcode arrived and was dropped
    ShortRead { discarded: usize },

    /// No receiver is registered for this opcode
    UnknownOpcode { code: Bytes },

    /// A handler ran for this opcode
    Dispatched { code: Bytes },
}

/// Counters over the lifetime of a protocol
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProtocolStats {
    pub dispatched: u64,
    pub short_reads: u64,
    pub unknown_opcodes: u64,
    pub decode_faults: u64,
}

// =============================================================================
// Registration phase
// =============================================================================

/// Collects receivers and senders before the protocol starts polling
pub struct ProtocolBuilder {
    input: Box<dyn InputStream + Send>,
    output: SharedOutput,
    local_code: Box<dyn IntegerCodec>,
    remote_code: Box<dyn IntegerCodec>,
    receivers: ReceiverRegistry,
    senders: Vec<InstructionInfo>,
}

impl ProtocolBuilder {
    /// Register a handler for incoming messages of this shape
    ///
    /// Takes the next index of the local namespace as opcode.
    pub fn add_receiver<S, F>(&mut self, serializer: S, handler: F, name: Option<&str>) -> Result<()>
    where
        S: Serializer,
        F: FnMut(S::Value) + Send + 'static,
    {
        let index = self.receivers.len();
        let code = self.local_code.encode_index(index)?;
        let instruction = Instruction::new(code, serializer, name.map(str::to_string));

        tracing::debug!("Registered receiver {}", instruction);
        self.receivers.insert(instruction, handler);
        Ok(())
    }

    /// Register an outgoing message shape and get its sender
    ///
    /// Takes the next index of the remote namespace as opcode.
    pub fn add_sender<S>(&mut self, serializer: S, name: Option<&str>) -> Result<Sender<S>>
    where
        S: Serializer,
    {
        let index = self.senders.len();
        let code = self.remote_code.encode_index(index)?;
        let instruction = Instruction::new(code, serializer, name.map(str::to_string));

        tracing::debug!("Registered sender {}", instruction);
        self.senders.push(instruction.info().clone());
        Ok(Sender::new(instruction, self.output.clone()))
    }

    pub fn senders(&self) -> impl Iterator<Item = &InstructionInfo> + '_ {
        self.senders.iter()
    }

    pub fn receivers(&self) -> impl Iterator<Item = &InstructionInfo> + '_ {
        self.receivers.infos()
    }

    /// Freeze the registries
    pub fn build(self) -> Protocol {
        Protocol {
            input: self.input,
            output: self.output,
            local_code: self.local_code,
            remote_code: self.remote_code,
            receivers: self.receivers,
            senders: self.senders,
            stats: ProtocolStats::default(),
        }
    }
}

// =============================================================================
// Dispatch phase
// =============================================================================

/// Frozen protocol: dispatches incoming messages to their handlers
pub struct Protocol {
    input: Box<dyn InputStream + Send>,
    output: SharedOutput,
    local_code: Box<dyn IntegerCodec>,
    remote_code: Box<dyn IntegerCodec>,
    receivers: ReceiverRegistry,
    senders: Vec<InstructionInfo>,
    stats: ProtocolStats,
}

impl Protocol {
    /// Start registering message shapes
    ///
    /// `local_code` encodes opcodes of messages this endpoint receives,
    /// `remote_code` those of messages it sends.
    pub fn builder<I, L, R>(input: I, output: SharedOutput, local_code: L, remote_code: R) -> ProtocolBuilder
    where
        I: InputStream + Send + 'static,
        L: IntegerCodec + 'static,
        R: IntegerCodec + 'static,
    {
        ProtocolBuilder {
            input: Box::new(input),
            output,
            local_code: Box::new(local_code),
            remote_code: Box::new(remote_code),
            receivers: ReceiverRegistry::default(),
            senders: Vec::new(),
        }
    }

    /// Service at most one incoming message
    pub fn poll(&mut self) -> Result<PollOutcome> {
        let width = self.local_code.width();
        let code = read_up_to(self.input.as_mut(), width)?;

        if code.is_empty() {
            return Ok(PollOutcome::Idle);
        }

        if code.len() < width {
            self.stats.short_reads += 1;
            tracing::debug!("Dropped partial opcode ({} of {} bytes)", code.len(), width);
            return Ok(PollOutcome::ShortRead {
                discarded: code.len(),
            });
        }

        let Some(receiver) = self.receivers.get_mut(&code) else {
            self.stats.unknown_opcodes += 1;
            tracing::warn!("Dropped unknown opcode {:02x?}", &code[..]);
            return Ok(PollOutcome::UnknownOpcode { code });
        };

        match receiver.dispatch(self.input.as_mut()) {
            Ok(()) => {
                self.stats.dispatched += 1;
                tracing::trace!("Dispatched {}", receiver.info());
                Ok(PollOutcome::Dispatched { code })
            }
            Err(e) => {
                if e.is_decode() {
                    self.stats.decode_faults += 1;
                }
                Err(e)
            }
        }
    }

    pub fn senders(&self) -> impl Iterator<Item = &InstructionInfo> + '_ {
        self.senders.iter()
    }

    pub fn receivers(&self) -> impl Iterator<Item = &InstructionInfo> + '_ {
        self.receivers.infos()
    }

    pub fn stats(&self) -> ProtocolStats {
        self.stats
    }

    /// Width of incoming opcodes
    pub fn local_code_width(&self) -> usize {
        self.local_code.width()
    }

    /// Width of outgoing opcodes
    pub fn remote_code_width(&self) -> usize {
        self.remote_code.width()
    }

    /// Output shared with the senders
    pub fn output(&self) -> &SharedOutput {
        &self.output
    }

    /// Printable list of every registered instruction
    pub fn manifest(&self) -> String {
        let mut out = String::from("Senders:");
        for info in self.senders() {
            out.push_str("\n  ");
            out.push_str(&info.to_string());
        }
        out.push_str("\nReceivers:");
        for info in self.receivers() {
            out.push_str("\n  ");
            out.push_str(&info.to_string());
        }
        out
    }
}
