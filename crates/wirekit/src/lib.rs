//! # wirekit
//!
//! Descriptor-driven codecs and coded messages.
//!
//! Describe a record type once with [`Reflect`] and the [`field!`] macro,
//! and get a compact binary encoding, a readable text encoding, and (after
//! registering it with a [`Protocol`]) coded framing and typed dispatch.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::OnceLock;
//! use wirekit::prelude::*;
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct UserJoined {
//!     who: String,
//! }
//!
//! impl Reflect for UserJoined {
//!     fn descriptor() -> &'static TypeDescriptor {
//!         static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
//!         DESCRIPTOR.get_or_init(|| {
//!             TypeDescriptor::builder::<UserJoined>("UserJoined")
//!                 .member("who", "user who joined", field!(UserJoined, who))
//!                 .build()
//!         })
//!     }
//! }
//!
//! fn main() -> Result<(), WirekitError> {
//!     let protocol = Protocol::builder("chat").add_pdu::<UserJoined>().build()?;
//!
//!     let mut stream = GrowableStream::new();
//!     protocol.encode(&UserJoined { who: "ada".into() }, &mut stream)?;
//!     stream.set_position(0)?;
//!
//!     let mut joined = Vec::new();
//!     let mut table = DispatchTable::new();
//!     table.add_handler(&protocol, |p: &UserJoined| joined.push(p.who.clone()))?;
//!
//!     let message = protocol.decode(usize::MAX, &mut stream)?;
//!     table.dispatch_message(&message)?;
//!     drop(table);
//!
//!     assert_eq!(joined, ["ada"]);
//!     assert_eq!(text::to_text(&UserJoined { who: "ada".into() })?, "[ \"ada\" ] ");
//!     Ok(())
//! }
//! ```

mod error;

pub use error::WirekitError;

pub use wirekit_protocol as protocol;
pub use wirekit_reflect as reflect;
pub use wirekit_stream as stream;

pub use wirekit_protocol::{Code, DispatchTable, Message, Protocol, ProtocolError};
pub use wirekit_reflect::{
    BinaryCodec, Codec, CodecError, MemberDoc, Reflect, TextCodec, TypeDescriptor, field,
    marshal, text,
};
pub use wirekit_stream::{GrowableStream, SliceStream, Stream, StreamConfig, StreamError};

/// The names most programs need, in one import.
pub mod prelude {
    pub use crate::WirekitError;
    pub use wirekit_protocol::{Code, DispatchTable, Message, Protocol, ProtocolError};
    pub use wirekit_reflect::{
        BinaryCodec, Codec, CodecError, MemberDoc, Reflect, TextCodec, TypeDescriptor, field,
        marshal, text,
    };
    pub use wirekit_stream::{GrowableStream, SliceStream, Stream, StreamError};
}
