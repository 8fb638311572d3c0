//! Error types for the protocol layer.

use wirekit_reflect::CodecError;
use wirekit_stream::StreamError;

use crate::Code;

/// Errors that can occur while registering PDUs, framing messages, or
/// dispatching them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The payload itself failed to encode or decode.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The type was never added to this protocol, so it has no code.
    #[error("type {0} is not registered with this protocol")]
    UnregisteredType(&'static str),

    /// A message arrived with a code this protocol does not know.
    /// Usually a version mismatch between the two ends, or garbage input.
    #[error("no PDU registered for code {0}")]
    UnknownCode(Code),

    /// The caller's size limit is smaller than the PDU it asked to decode.
    /// Checked before anything is constructed.
    #[error("decoding needs {needed} bytes but only {available} are allowed")]
    BufferTooSmall { needed: usize, available: usize },

    /// A dispatch table has no handler for the code.
    #[error("no handler registered for code {0}")]
    UnregisteredHandler(Code),

    /// The same type was added to a protocol twice.
    #[error("PDU {0} is already registered")]
    DuplicatePdu(&'static str),

    /// A strict handler registration found the code already taken.
    #[error("a handler is already registered for code {0}")]
    HandlerAlreadyRegistered(Code),

    /// A value handed to dispatch or destroy is not the type registered
    /// for its code.
    #[error("value for code {code} is not a {expected}")]
    TypeMismatch { code: Code, expected: &'static str },
}

/// Stream failures are codec failures one level down.
impl From<StreamError> for ProtocolError {
    fn from(err: StreamError) -> Self {
        Self::Codec(CodecError::Stream(err))
    }
}
