//! The protocol registry: which PDU types exist and what their codes are.
//!
//! A protocol is a named, ordered set of record types. Registration order
//! defines the wire codes, so both ends must register the same types in the
//! same order. On the wire every message is framed as:
//!
//! ```text
//! [ code: u32, host order ][ payload: the type's binary encoding ]
//! ```
//!
//! # Concurrency note
//!
//! `Protocol` is mutable only while it is being assembled. Once built it is
//! usually stored in a `static OnceLock` and shared by reference, which is
//! safe because every later operation takes `&self`.

use std::any::{self, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use wirekit_reflect::{Reflect, TypeDescriptor, marshal};
use wirekit_stream::{Stream, read_u32, write_u32};

use crate::{Code, Message, ProtocolError};

/// A registry of PDU types and their codes.
pub struct Protocol {
    name: String,

    /// Descriptors keyed by code. A `BTreeMap` keeps them in code order,
    /// which is also registration order.
    by_code: BTreeMap<Code, &'static TypeDescriptor>,

    /// The reverse index, from Rust type to code. Kept in sync with
    /// `by_code`.
    by_type: HashMap<TypeId, Code>,
}

impl Protocol {
    /// Creates a protocol with no PDUs.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            by_code: BTreeMap::new(),
            by_type: HashMap::new(),
        }
    }

    /// Starts a protocol that is assembled by chaining `add_pdu` calls.
    pub fn builder(name: impl Into<String>) -> ProtocolBuilder {
        ProtocolBuilder {
            protocol: Self::new(name),
            error: None,
        }
    }

    /// Registers `T` and returns its code: one more than the previous
    /// registration, starting at 1.
    ///
    /// # Errors
    /// [`ProtocolError::DuplicatePdu`] if `T` is already registered.
    pub fn add_pdu<T: Reflect>(&mut self) -> Result<Code, ProtocolError> {
        let descriptor = T::descriptor();
        if self.by_type.contains_key(&TypeId::of::<T>()) {
            return Err(ProtocolError::DuplicatePdu(descriptor.name()));
        }

        let code = Code(self.by_code.keys().next_back().map_or(1, |last| last.0 + 1));
        self.by_code.insert(code, descriptor);
        self.by_type.insert(TypeId::of::<T>(), code);

        tracing::debug!(protocol = %self.name, pdu = descriptor.name(), %code, "registered PDU");
        Ok(code)
    }

    /// The code registered for `T`.
    ///
    /// # Errors
    /// [`ProtocolError::UnregisteredType`] if `T` was never added.
    pub fn code<T: Reflect>(&self) -> Result<Code, ProtocolError> {
        self.by_type
            .get(&TypeId::of::<T>())
            .copied()
            .ok_or(ProtocolError::UnregisteredType(any::type_name::<T>()))
    }

    /// The descriptor registered under `code`.
    ///
    /// # Errors
    /// [`ProtocolError::UnknownCode`] if nothing is registered under it.
    pub fn type_for(&self, code: Code) -> Result<&'static TypeDescriptor, ProtocolError> {
        self.by_code
            .get(&code)
            .copied()
            .ok_or(ProtocolError::UnknownCode(code))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of registered PDU types.
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    /// Registered PDUs in code order.
    pub fn pdus(&self) -> impl Iterator<Item = (Code, &'static TypeDescriptor)> + '_ {
        self.by_code.iter().map(|(code, descriptor)| (*code, *descriptor))
    }

    /// Writes `value` to `out` as a coded message.
    pub fn encode<T: Reflect>(&self, value: &T, out: &mut dyn Stream) -> Result<(), ProtocolError> {
        let code = self.code::<T>()?;
        write_u32(out, code.0)?;
        marshal::encode(value, out)?;
        Ok(())
    }

    /// Reads one coded message from `input`.
    ///
    /// `max_size` bounds the in-memory size of the PDU the caller is
    /// prepared to accept. It is checked against the registered type before
    /// any value is constructed.
    ///
    /// # Errors
    /// - [`ProtocolError::UnknownCode`] for an unregistered code
    /// - [`ProtocolError::BufferTooSmall`] if the PDU is larger than `max_size`
    /// - [`ProtocolError::Codec`] if the payload is truncated or malformed;
    ///   the partially decoded value is dropped
    pub fn decode(&self, max_size: usize, input: &mut dyn Stream) -> Result<Message, ProtocolError> {
        let code = Code(read_u32(input)?);
        let descriptor = self.type_for(code)?;
        if descriptor.size() > max_size {
            return Err(ProtocolError::BufferTooSmall {
                needed: descriptor.size(),
                available: max_size,
            });
        }

        let mut value = descriptor.access().create();
        if let Err(err) = descriptor.access().read_binary(&mut *value, input) {
            tracing::debug!(
                protocol = %self.name,
                pdu = descriptor.name(),
                %code,
                error = %err,
                "failed to decode message"
            );
            return Err(err.into());
        }
        Ok(Message::new(code, descriptor.name(), value))
    }

    /// Releases a decoded message after checking it belongs to this
    /// protocol.
    ///
    /// Dropping a [`Message`] has the same effect; this form reports a
    /// message whose code or payload type does not match the registry.
    pub fn destroy(&self, message: Message) -> Result<(), ProtocolError> {
        let code = message.code();
        let descriptor = self.type_for(code)?;
        descriptor
            .access()
            .destroy_boxed(message.into_value())
            .map_err(|_| ProtocolError::TypeMismatch {
                code,
                expected: descriptor.name(),
            })
    }
}

impl fmt::Debug for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Protocol")
            .field("name", &self.name)
            .field(
                "pdus",
                &self
                    .pdus()
                    .map(|(code, descriptor)| (code.0, descriptor.name()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Assembles a [`Protocol`] by chaining registrations.
///
/// The first failing registration is remembered and reported by
/// [`build`](Self::build); later registrations are skipped.
#[derive(Debug)]
pub struct ProtocolBuilder {
    protocol: Protocol,
    error: Option<ProtocolError>,
}

impl ProtocolBuilder {
    pub fn add_pdu<T: Reflect>(mut self) -> Self {
        if self.error.is_none() {
            if let Err(err) = self.protocol.add_pdu::<T>() {
                self.error = Some(err);
            }
        }
        self
    }

    pub fn build(self) -> Result<Protocol, ProtocolError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.protocol),
        }
    }
}
