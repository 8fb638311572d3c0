//! Unified error type for wirekit.

use wirekit_protocol::ProtocolError;
use wirekit_reflect::CodecError;
use wirekit_stream::StreamError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `wirekit` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WirekitError {
    /// A byte stream error (underflow, seek, oversized block).
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// A codec error (malformed text, bad UTF-8, type mismatch).
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A protocol error (unknown code, missing handler, size limit).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use wirekit_protocol::Code;

    #[test]
    fn test_from_stream_error() {
        let err = StreamError::Underflow {
            requested: 4,
            available: 1,
        };
        let wirekit_err: WirekitError = err.into();
        assert!(matches!(wirekit_err, WirekitError::Stream(_)));
        assert!(wirekit_err.to_string().contains("requested 4 bytes"));
    }

    #[test]
    fn test_from_codec_error() {
        let wirekit_err: WirekitError = CodecError::InvalidUtf8.into();
        assert!(matches!(wirekit_err, WirekitError::Codec(_)));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::UnregisteredHandler(Code(4));
        let wirekit_err: WirekitError = err.into();
        assert!(matches!(wirekit_err, WirekitError::Protocol(_)));
        assert!(wirekit_err.to_string().contains("#4"));
    }

    #[test]
    fn test_question_mark_converts() {
        fn fails() -> Result<(), WirekitError> {
            Err(CodecError::CollectionTooLarge(1))?;
            Ok(())
        }
        assert!(matches!(fails(), Err(WirekitError::Codec(_))));
    }
}
