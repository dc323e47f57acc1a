//! Typed sender handles

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::instruction::{Instruction, InstructionInfo};
use crate::serializer::Serializer;
use crate::stream::SharedOutput;

/// Callable handle for one outgoing instruction
///
/// Cloneable and shareable across threads. Each `send` holds the output lock
/// for a single write, so opcode and payload are never split by another
/// sender of the same protocol.
pub struct Sender<S> {
    instruction: Arc<Instruction<S>>,
    output: SharedOutput,
}

impl<S: Serializer> Sender<S> {
    pub(crate) fn new(instruction: Instruction<S>, output: SharedOutput) -> Self {
        Self {
            instruction: Arc::new(instruction),
            output,
        }
    }

    /// Transmit one message
    pub fn send(&self, value: S::Value) -> Result<()> {
        let mut output = self.output.lock();
        self.instruction.send(&mut *output, &value)?;
        tracing::trace!("Sent {}", self.instruction);
        Ok(())
    }

    pub fn info(&self) -> &InstructionInfo {
        self.instruction.info()
    }

    pub fn instruction(&self) -> &Instruction<S> {
        &self.instruction
    }
}

impl<S> Clone for Sender<S> {
    fn clone(&self) -> Self {
        Self {
            instruction: Arc::clone(&self.instruction),
            output: Arc::clone(&self.output),
        }
    }
}

impl<S> fmt::Debug for Sender<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sender")
            .field("instruction", &self.instruction.to_string())
            .finish()
    }
}
