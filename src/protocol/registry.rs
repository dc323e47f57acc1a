//! Receive registry
//!
//! Append-only, insertion-ordered map from opcode to (instruction, handler).

use std::collections::HashMap;

use bytes::Bytes;

use crate::error::Result;
use crate::instruction::{Instruction, InstructionInfo};
use crate::serializer::Serializer;
use crate::stream::InputStream;

/// A receiver with its value type erased
pub(crate) trait Dispatch: Send {
    fn info(&self) -> &InstructionInfo;

    /// Decode the payload and run the handler
    fn dispatch(&mut self, input: &mut dyn InputStream) -> Result<()>;
}

struct Binding<S, F> {
    instruction: Instruction<S>,
    handler: F,
}

impl<S, F> Dispatch for Binding<S, F>
where
    S: Serializer,
    F: FnMut(S::Value) + Send,
{
    fn info(&self) -> &InstructionInfo {
        self.instruction.info()
    }

    fn dispatch(&mut self, input: &mut dyn InputStream) -> Result<()> {
        let value = self.instruction.receive(input)?;
        (self.handler)(value);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct ReceiverRegistry {
    entries: Vec<Box<dyn Dispatch>>,
    by_code: HashMap<Bytes, usize>,
}

impl ReceiverRegistry {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn insert<S, F>(&mut self, instruction: Instruction<S>, handler: F)
    where
        S: Serializer,
        F: FnMut(S::Value) + Send + 'static,
    {
        self.by_code
            .insert(instruction.code().clone(), self.entries.len());
        self.entries.push(Box::new(Binding {
            instruction,
            handler,
        }));
    }

    pub fn get_mut(&mut self, code: &[u8]) -> Option<&mut (dyn Dispatch + 'static)> {
        let index = *self.by_code.get(code)?;
        self.entries.get_mut(index).map(|entry| entry.as_mut())
    }

    /// Registered instructions in registration order
    pub fn infos(&self) -> impl Iterator<Item = &InstructionInfo> + '_ {
        self.entries.iter().map(|entry| entry.info())
    }
}
