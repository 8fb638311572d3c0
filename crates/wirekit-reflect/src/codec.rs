//! Codec trait and its two implementations.
//!
//! A "codec" (coder/decoder) turns a described value into a self-contained
//! byte buffer and back. Code that only needs "some encoding" can take a
//! `C: Codec` and let the caller pick binary (compact, for the wire) or
//! text (readable, for logs and files). This is the strategy pattern: one
//! interface, swappable implementations.

use wirekit_stream::{GrowableStream, SliceStream, Stream};

use crate::descriptor::Reflect;
use crate::{CodecError, marshal, text};

/// Encodes described values to bytes and decodes them back.
///
/// ## Trait bounds explained
///
/// - `Send + Sync` → a codec can be shared between threads, e.g. stored
///   once and used by every connection handler.
/// - `'static` → the codec owns everything it needs.
///
/// Unlike [`marshal::decode`], `decode` here consumes the whole buffer:
/// leftover bytes mean the buffer did not hold exactly one value.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a fresh buffer.
    fn encode<T: Reflect>(&self, value: &T) -> Result<Vec<u8>, CodecError>;

    /// Deserializes a value from a complete buffer.
    ///
    /// # Errors
    /// Any decoding error for `T`, or [`CodecError::TrailingBytes`] if the
    /// buffer holds more than one value's worth of data.
    fn decode<T: Reflect>(&self, data: &[u8]) -> Result<T, CodecError>;
}

// ---------------------------------------------------------------------------
// BinaryCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses the binary marshaller.
///
/// ```rust
/// use std::sync::OnceLock;
/// use wirekit_reflect::{field, BinaryCodec, Codec, Reflect, TypeDescriptor};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Joined {
///     who: String,
/// }
///
/// impl Reflect for Joined {
///     fn descriptor() -> &'static TypeDescriptor {
///         static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
///         DESCRIPTOR.get_or_init(|| {
///             TypeDescriptor::builder::<Joined>("Joined")
///                 .member("who", "user who joined", field!(Joined, who))
///                 .build()
///         })
///     }
/// }
///
/// let codec = BinaryCodec;
/// let bytes = codec.encode(&Joined { who: "ada".into() }).unwrap();
/// let back: Joined = codec.decode(&bytes).unwrap();
/// assert_eq!(back.who, "ada");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCodec;

impl Codec for BinaryCodec {
    fn encode<T: Reflect>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        let mut stream = GrowableStream::new();
        marshal::encode(value, &mut stream)?;
        Ok(stream.into_bytes())
    }

    fn decode<T: Reflect>(&self, data: &[u8]) -> Result<T, CodecError> {
        let mut stream = SliceStream::new(data);
        let value = marshal::decode_new(&mut stream)?;
        match stream.bytes_left() {
            0 => Ok(value),
            left => Err(CodecError::TrailingBytes(left)),
        }
    }
}

// ---------------------------------------------------------------------------
// TextCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses the text format, UTF-8 encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl Codec for TextCodec {
    fn encode<T: Reflect>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        Ok(text::to_text(value)?.into_bytes())
    }

    fn decode<T: Reflect>(&self, data: &[u8]) -> Result<T, CodecError> {
        let input = std::str::from_utf8(data).map_err(|_| CodecError::InvalidUtf8)?;
        text::from_text(input)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::OnceLock;

    use super::*;
    use crate::{ParseErrorKind, TypeDescriptor, field};

    #[derive(Debug, Default, PartialEq)]
    struct Reading {
        sensor: u8,
        values: Vec<f64>,
        note: String,
    }

    impl Reflect for Reading {
        fn descriptor() -> &'static TypeDescriptor {
            static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
            DESCRIPTOR.get_or_init(|| {
                TypeDescriptor::builder::<Reading>("Reading")
                    .member("sensor", "sensor number", field!(Reading, sensor))
                    .member("values", "samples", field!(Reading, values))
                    .member("note", "free text", field!(Reading, note))
                    .build()
            })
        }
    }

    fn sample() -> Reading {
        Reading {
            sensor: 4,
            values: vec![0.25, -3.0],
            note: "ok".into(),
        }
    }

    // A generic helper proves both codecs are interchangeable.
    fn round_trip<C: Codec>(codec: &C) -> Reading {
        let bytes = codec.encode(&sample()).unwrap();
        codec.decode(&bytes).unwrap()
    }

    #[test]
    fn test_both_codecs_round_trip() {
        assert_eq!(round_trip(&BinaryCodec), sample());
        assert_eq!(round_trip(&TextCodec), sample());
    }

    #[test]
    fn test_text_codec_output_is_readable() {
        let bytes = TextCodec.encode(&sample()).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"[ 4 { 0.25 -3 } "ok" ] "#
        );
    }

    #[test]
    fn test_binary_decode_rejects_trailing_bytes() {
        let mut bytes = BinaryCodec.encode(&sample()).unwrap();
        bytes.extend_from_slice(&[0, 0]);
        assert_eq!(
            BinaryCodec.decode::<Reading>(&bytes),
            Err(CodecError::TrailingBytes(2))
        );
    }

    #[test]
    fn test_text_decode_rejects_garbage() {
        assert_eq!(
            TextCodec.decode::<Reading>(&[0xff]),
            Err(CodecError::InvalidUtf8)
        );
        let err = TextCodec
            .decode::<Reading>(br#"[ 4 { } "ok" ] extra"#)
            .unwrap_err();
        assert_eq!(err.parse_kind(), Some(ParseErrorKind::InvalidToken));
    }
}
