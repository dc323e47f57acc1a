//! # ByteLang Bridge
//!
//! A minimal bidirectional binary messaging protocol over a byte stream:
//! - Typed serializers for primitives, structs, void and byte vectors
//! - Opcodes allocated by registration order, one namespace per direction
//! - Synchronous poll-based dispatch to registered handlers
//! - Serial transport with rediscovery and bounded reconnect backoff
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Domain component (Robot)                     │
//! │          holds senders, registers receive handlers           │
//! └──────────────┬──────────────────────────────┬───────────────┘
//!                │ Sender::send                 │ handlers
//! ┌──────────────▼──────────────────────────────┴───────────────┐
//! │                         Protocol                             │
//! │        opcode allocation / registries / poll dispatch        │
//! └──────────────┬──────────────────────────────▲───────────────┘
//!                │                              │ PollWorker
//!          ┌─────▼──────┐                 ┌─────┴──────┐
//!          │   Output   │                 │   Input    │
//!          │   stream   │                 │   stream   │
//!          └─────┬──────┘                 └─────▲──────┘
//!                └──────────► Transport ────────┘
//!                          (serial link)
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod serializer;
pub mod stream;
pub mod instruction;
pub mod protocol;
pub mod link;
pub mod robot;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{BridgeError, Result};
pub use config::Config;
pub use instruction::{Instruction, InstructionInfo};
pub use protocol::{PollOutcome, Protocol, ProtocolBuilder, Sender};
pub use link::{LinkState, PollWorker};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of the bridge
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
