//! Protocol Module
//!
//! Opcode allocation, message dispatch and typed senders.
//!
//! ## Message Format
//! ```text
//! ┌──────────────────┬──────────────────────────────┐
//! │ Opcode (N bytes) │ Payload (serializer-defined) │
//! └──────────────────┴──────────────────────────────┘
//! ```
//!
//! ### Opcodes
//! Opcode = zero-based registration index within its direction, encoded
//! with that direction's integer codec:
//! - receivers: local codec (also used to read incoming opcodes)
//! - senders: remote codec
//!
//! Both peers must register message shapes in the same order. A mismatch
//! cannot be detected here and shows up as misread payloads.
//!
//! ### Lifecycle
//! 1. `Protocol::builder(..)` opens the registration phase
//! 2. `add_receiver` / `add_sender` append to the registries
//! 3. `build()` freezes them into a `Protocol` that only polls

mod engine;
mod registry;
mod sender;

pub use engine::{PollOutcome, Protocol, ProtocolBuilder, ProtocolStats};
pub use sender::Sender;
