//! Routing decoded messages to handlers by code.
//!
//! A [`DispatchTable`] maps each code to one closure. The closure captures
//! whatever it needs (a connection, a chat room, a counter), and receives
//! the payload already downcast to its registered type:
//!
//! ```text
//! decode() ──→ Message { code, value } ──→ dispatch() ──→ handler(&T)
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use wirekit_reflect::Reflect;

use crate::{Code, Message, Protocol, ProtocolError};

type Handler<'h> = Box<dyn FnMut(&dyn Any) -> Result<(), ProtocolError> + 'h>;

/// Per-code message handlers.
///
/// The `'h` lifetime lets handlers borrow from the surrounding scope, so a
/// table can be built on the stack around local state without `Rc` or
/// `Arc`.
pub struct DispatchTable<'h> {
    handlers: HashMap<Code, Handler<'h>>,
}

impl<'h> DispatchTable<'h> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Installs `handler` for `T`'s code in `protocol`, replacing any
    /// handler already there.
    ///
    /// # Errors
    /// [`ProtocolError::UnregisteredType`] if `T` is not part of `protocol`.
    pub fn add_handler<T: Reflect>(
        &mut self,
        protocol: &Protocol,
        handler: impl FnMut(&T) + 'h,
    ) -> Result<Code, ProtocolError> {
        let code = protocol.code::<T>()?;
        if self.handlers.insert(code, wrap(code, handler)).is_some() {
            tracing::warn!(%code, pdu = T::descriptor().name(), "replaced dispatch handler");
        }
        Ok(code)
    }

    /// Like [`add_handler`](Self::add_handler), but refuses to replace.
    ///
    /// # Errors
    /// [`ProtocolError::HandlerAlreadyRegistered`] if the code already has
    /// a handler; the existing one stays in place.
    pub fn try_add_handler<T: Reflect>(
        &mut self,
        protocol: &Protocol,
        handler: impl FnMut(&T) + 'h,
    ) -> Result<Code, ProtocolError> {
        let code = protocol.code::<T>()?;
        if self.handlers.contains_key(&code) {
            return Err(ProtocolError::HandlerAlreadyRegistered(code));
        }
        self.handlers.insert(code, wrap(code, handler));
        Ok(code)
    }

    /// Calls the handler for `code` with `value`.
    ///
    /// # Errors
    /// - [`ProtocolError::UnregisteredHandler`] if no handler is installed;
    ///   `value` is left untouched
    /// - [`ProtocolError::TypeMismatch`] if `value` is not the type the
    ///   handler was registered for
    pub fn dispatch(&mut self, code: Code, value: &dyn Any) -> Result<(), ProtocolError> {
        let handler = self
            .handlers
            .get_mut(&code)
            .ok_or(ProtocolError::UnregisteredHandler(code))?;
        tracing::trace!(%code, "dispatching message");
        handler(value)
    }

    /// Dispatches a decoded message by its own code.
    pub fn dispatch_message(&mut self, message: &Message) -> Result<(), ProtocolError> {
        self.dispatch(message.code(), message.value())
    }

    pub fn has_handler(&self, code: Code) -> bool {
        self.handlers.contains_key(&code)
    }

    /// Removes the handler for `code`. Returns `true` if there was one.
    pub fn remove_handler(&mut self, code: Code) -> bool {
        self.handlers.remove(&code).is_some()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

fn wrap<'h, T: Reflect>(code: Code, mut handler: impl FnMut(&T) + 'h) -> Handler<'h> {
    Box::new(move |value: &dyn Any| -> Result<(), ProtocolError> {
        let value = value
            .downcast_ref::<T>()
            .ok_or_else(|| ProtocolError::TypeMismatch {
                code,
                expected: T::descriptor().name(),
            })?;
        handler(value);
        Ok(())
    })
}

impl Default for DispatchTable<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DispatchTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut codes: Vec<_> = self.handlers.keys().map(|code| code.0).collect();
        codes.sort_unstable();
        f.debug_struct("DispatchTable").field("codes", &codes).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::testing::{Chat, Ping, Unlisted};

    fn protocol() -> Protocol {
        Protocol::builder("test")
            .add_pdu::<Ping>()
            .add_pdu::<Chat>()
            .build()
            .unwrap()
    }

    #[test]
    fn test_dispatch_reaches_typed_handler() {
        let protocol = protocol();
        let mut heard = Vec::new();
        {
            let mut table = DispatchTable::new();
            table
                .add_handler(&protocol, |chat: &Chat| heard.push(chat.what.clone()))
                .unwrap();
            let chat = Chat {
                who: "ann".into(),
                what: "hi".into(),
            };
            table.dispatch(Code(2), &chat).unwrap();
            table.dispatch(Code(2), &chat).unwrap();
        }
        assert_eq!(heard, ["hi", "hi"]);
    }

    #[test]
    fn test_missing_handler() {
        let protocol = protocol();
        let calls = Cell::new(0);
        let mut table = DispatchTable::new();
        table
            .add_handler(&protocol, |_: &Ping| calls.set(calls.get() + 1))
            .unwrap();

        assert_eq!(
            table.dispatch(Code(2), &Chat::default()),
            Err(ProtocolError::UnregisteredHandler(Code(2)))
        );
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_wrong_value_type_is_a_mismatch() {
        let protocol = protocol();
        let mut table = DispatchTable::new();
        table.add_handler(&protocol, |_: &Ping| {}).unwrap();
        assert_eq!(
            table.dispatch(Code(1), &Chat::default()),
            Err(ProtocolError::TypeMismatch {
                code: Code(1),
                expected: "Ping"
            })
        );
    }

    #[test]
    fn test_add_handler_replaces() {
        let protocol = protocol();
        let first = Cell::new(0);
        let second = Cell::new(0);
        let mut table = DispatchTable::new();
        table
            .add_handler(&protocol, |_: &Ping| first.set(first.get() + 1))
            .unwrap();
        table
            .add_handler(&protocol, |_: &Ping| second.set(second.get() + 1))
            .unwrap();
        assert_eq!(table.len(), 1);

        table.dispatch(Code(1), &Ping { seq: 0 }).unwrap();
        assert_eq!((first.get(), second.get()), (0, 1));
    }

    #[test]
    fn test_try_add_handler_keeps_existing() {
        let protocol = protocol();
        let kept = Cell::new(false);
        let mut table = DispatchTable::new();
        table
            .try_add_handler(&protocol, |_: &Ping| kept.set(true))
            .unwrap();
        assert_eq!(
            table.try_add_handler(&protocol, |_: &Ping| {}),
            Err(ProtocolError::HandlerAlreadyRegistered(Code(1)))
        );
        table.dispatch(Code(1), &Ping::default()).unwrap();
        assert!(kept.get());
    }

    #[test]
    fn test_handler_for_unregistered_type() {
        let protocol = protocol();
        let mut table = DispatchTable::new();
        assert!(matches!(
            table.add_handler(&protocol, |_: &Unlisted| {}),
            Err(ProtocolError::UnregisteredType(_))
        ));
        assert!(table.is_empty());
    }

    #[test]
    fn test_remove_handler() {
        let protocol = protocol();
        let mut table = DispatchTable::new();
        let code = table.add_handler(&protocol, |_: &Chat| {}).unwrap();
        assert!(table.has_handler(code));
        assert!(table.remove_handler(code));
        assert!(!table.remove_handler(code));
        assert!(!table.has_handler(code));
    }
}
