//! Message codes and decoded messages.

use std::any::Any;
use std::fmt;

/// The numeric code identifying a PDU type on the wire.
///
/// Codes are assigned by a [`Protocol`](crate::Protocol) in registration
/// order, starting at 1. Displayed as `#<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Code(pub u32);

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A decoded PDU of some registered type, tagged with its code.
///
/// The message owns the value. Dropping it releases everything the value
/// holds, so a message can never be destroyed twice or leaked by a failed
/// handler.
pub struct Message {
    code: Code,
    pdu: &'static str,
    value: Box<dyn Any + Send>,
}

impl Message {
    pub(crate) fn new(code: Code, pdu: &'static str, value: Box<dyn Any + Send>) -> Self {
        Self { code, pdu, value }
    }

    pub fn code(&self) -> Code {
        self.code
    }

    /// Name of the PDU type, as registered.
    pub fn pdu(&self) -> &'static str {
        self.pdu
    }

    pub fn value(&self) -> &dyn Any {
        &*self.value
    }

    /// Returns `true` if the payload is a `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.value.is::<T>()
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    /// Takes the payload out as a `T`, or gives the message back unchanged
    /// if it holds something else.
    pub fn into_inner<T: 'static>(self) -> Result<T, Message> {
        let Self { code, pdu, value } = self;
        match value.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(value) => Err(Self { code, pdu, value }),
        }
    }

    pub(crate) fn into_value(self) -> Box<dyn Any + Send> {
        self.value
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("code", &self.code)
            .field("pdu", &self.pdu)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_display() {
        assert_eq!(Code(3).to_string(), "#3");
    }

    #[test]
    fn test_into_inner_right_and_wrong_type() {
        let message = Message::new(Code(1), "Number", Box::new(42u32));
        assert!(message.is::<u32>());
        assert_eq!(message.downcast_ref::<u32>(), Some(&42));

        let message = message.into_inner::<String>().unwrap_err();
        assert_eq!(message.code(), Code(1));
        assert_eq!(message.into_inner::<u32>().unwrap(), 42);
    }
}
