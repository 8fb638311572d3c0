//! Coded messages for wirekit.
//!
//! This crate turns described record types into a message protocol:
//!
//! 1. **Registry** — a [`Protocol`] assigns each PDU type a [`Code`] and
//!    frames values as `code + payload`
//! 2. **Decoding** — [`Protocol::decode`] reads any registered PDU into an
//!    owned [`Message`]
//! 3. **Dispatch** — a [`DispatchTable`] routes messages to typed handlers
//!
//! # How it fits in the stack
//!
//! ```text
//! Application (above)  ← registers PDUs, installs handlers
//!     ↕
//! Protocol Layer (this crate)  ← codes, framing, dispatch
//!     ↕
//! Reflect Layer (below)  ← descriptors and the binary marshaller
//! ```

mod dispatch;
mod error;
mod message;
mod registry;

#[cfg(test)]
mod testing;

pub use dispatch::DispatchTable;
pub use error::ProtocolError;
pub use message::{Code, Message};
pub use registry::{Protocol, ProtocolBuilder};
