//! Which Rust types can be members, and how leaf values are encoded.
//!
//! [`Field`] is implemented for three families of types:
//!
//! - scalars (integers, floats, `bool`, `String`) through [`Scalar`],
//! - every [`Reflect`] type, which nests as a compound member,
//! - the standard collections, whose element type is itself a `Field`.

use std::mem;

use wirekit_stream::{Stream, read_block_data, read_block_length, write_block};

use crate::accessor::Shape;
use crate::descriptor::Reflect;
use crate::text::{TextReader, quote};
use crate::CodecError;

/// A type that can appear as a member of a described record.
pub trait Field: Default + Send + 'static {
    /// Decides how values of this type are encoded.
    fn shape() -> Shape;
}

impl<T: Reflect> Field for T {
    fn shape() -> Shape {
        Shape::compound::<T>()
    }
}

/// A leaf value with its own binary and text encoding.
///
/// Implement this (together with `Field`, returning [`Shape::scalar`]) for
/// custom leaf types such as identifiers or timestamps.
pub trait Scalar: Field {
    /// Appends the binary form to `out`.
    fn write_binary(&self, out: &mut dyn Stream) -> Result<(), CodecError>;

    /// Replaces `self` with a value read from `input`.
    fn read_binary(&mut self, input: &mut dyn Stream) -> Result<(), CodecError>;

    /// Appends the text token, without the trailing separator.
    fn write_text(&self, out: &mut String);

    /// Replaces `self` with a value parsed from the next token. Leading
    /// whitespace has already been skipped.
    fn read_text(&mut self, input: &mut TextReader<'_>) -> Result<(), CodecError>;
}

// Fixed-width numbers travel in host byte order, exactly `size_of` bytes.
// Their text form is the `Display` output, which for floats is the shortest
// string that parses back to the same value.
macro_rules! numeric_scalar {
    ($($ty:ty),* $(,)?) => {$(
        impl Field for $ty {
            fn shape() -> Shape {
                Shape::scalar::<$ty>()
            }
        }

        impl Scalar for $ty {
            fn write_binary(&self, out: &mut dyn Stream) -> Result<(), CodecError> {
                out.write_bytes(&self.to_ne_bytes())?;
                Ok(())
            }

            fn read_binary(&mut self, input: &mut dyn Stream) -> Result<(), CodecError> {
                let bytes = input.read_bytes(mem::size_of::<$ty>())?;
                let mut raw = [0u8; mem::size_of::<$ty>()];
                raw.copy_from_slice(bytes);
                *self = <$ty>::from_ne_bytes(raw);
                Ok(())
            }

            fn write_text(&self, out: &mut String) {
                out.push_str(&self.to_string());
            }

            fn read_text(&mut self, input: &mut TextReader<'_>) -> Result<(), CodecError> {
                *self = input.parse_token::<$ty>()?;
                Ok(())
            }
        }
    )*};
}

numeric_scalar!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl Field for bool {
    fn shape() -> Shape {
        Shape::scalar::<bool>()
    }
}

/// One byte, zero for `false`. Any non-zero byte reads as `true`.
///
/// The text tokens are `true` and `false`. Numeric `1` and `0` tokens are
/// not accepted.
impl Scalar for bool {
    fn write_binary(&self, out: &mut dyn Stream) -> Result<(), CodecError> {
        out.write_bytes(&[u8::from(*self)])?;
        Ok(())
    }

    fn read_binary(&mut self, input: &mut dyn Stream) -> Result<(), CodecError> {
        *self = input.read_bytes(1)?[0] != 0;
        Ok(())
    }

    fn write_text(&self, out: &mut String) {
        out.push_str(if *self { "true" } else { "false" });
    }

    fn read_text(&mut self, input: &mut TextReader<'_>) -> Result<(), CodecError> {
        *self = input.parse_token::<bool>()?;
        Ok(())
    }
}

impl Field for String {
    fn shape() -> Shape {
        Shape::scalar::<String>()
    }
}

/// A length-prefixed block of UTF-8 bytes; in text, a quoted string.
impl Scalar for String {
    fn write_binary(&self, out: &mut dyn Stream) -> Result<(), CodecError> {
        write_block(out, self.as_bytes())?;
        Ok(())
    }

    fn read_binary(&mut self, input: &mut dyn Stream) -> Result<(), CodecError> {
        let len = read_block_length(input)?;
        let bytes = read_block_data(input, len)?;
        let text = std::str::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)?;
        self.clear();
        self.push_str(text);
        Ok(())
    }

    fn write_text(&self, out: &mut String) {
        quote(self, out);
    }

    fn read_text(&mut self, input: &mut TextReader<'_>) -> Result<(), CodecError> {
        *self = input.read_quoted()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use wirekit_stream::{GrowableStream, SliceStream, StreamError};

    use super::*;
    use crate::ParseErrorKind;

    fn binary<S: Scalar>(value: &S) -> Vec<u8> {
        let mut stream = GrowableStream::new();
        value.write_binary(&mut stream).unwrap();
        stream.into_bytes()
    }

    #[test]
    fn test_integers_use_exact_width() {
        assert_eq!(binary(&7u8).len(), 1);
        assert_eq!(binary(&-7i16).len(), 2);
        assert_eq!(binary(&7u32), 7u32.to_ne_bytes());
        assert_eq!(binary(&-7i64), (-7i64).to_ne_bytes());
    }

    #[test]
    fn test_bool_text_rejects_numeric_tokens() {
        let mut value = false;
        value.read_text(&mut TextReader::new("true")).unwrap();
        assert!(value);
        let err = value.read_text(&mut TextReader::new("1")).unwrap_err();
        assert_eq!(err.parse_kind(), Some(ParseErrorKind::InvalidToken));
    }

    #[test]
    fn test_bool_is_one_byte() {
        assert_eq!(binary(&true), [1]);
        assert_eq!(binary(&false), [0]);

        let mut value = false;
        value.read_binary(&mut SliceStream::new(&[42])).unwrap();
        assert!(value);
    }

    #[test]
    fn test_string_is_a_block() {
        let bytes = binary(&"hey".to_string());
        assert_eq!(&bytes[..4], &3u32.to_ne_bytes());
        assert_eq!(&bytes[4..], b"hey");
    }

    #[test]
    fn test_string_rejects_invalid_utf8() {
        let mut bytes = 2u32.to_ne_bytes().to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe]);
        let mut value = String::from("unchanged");
        let err = value
            .read_binary(&mut SliceStream::new(&bytes))
            .unwrap_err();
        assert_eq!(err, CodecError::InvalidUtf8);
    }

    #[test]
    fn test_short_input_underflows() {
        let mut value = 0u32;
        let err = value.read_binary(&mut SliceStream::new(&[1, 2])).unwrap_err();
        assert_eq!(
            err,
            CodecError::Stream(StreamError::Underflow {
                requested: 4,
                available: 2
            })
        );
    }

    #[test]
    fn test_text_tokens() {
        let mut out = String::new();
        (-12i32).write_text(&mut out);
        out.push(' ');
        true.write_text(&mut out);
        out.push(' ');
        0.1f64.write_text(&mut out);
        assert_eq!(out, "-12 true 0.1");
    }

    #[test]
    fn test_float_text_is_exact() {
        let original = 1.0f64 / 3.0;
        let mut out = String::new();
        original.write_text(&mut out);

        let mut parsed = 0.0f64;
        parsed.read_text(&mut TextReader::new(&out)).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_bad_token_is_invalid() {
        let mut value = 0u8;
        let err = value
            .read_text(&mut TextReader::new("300 "))
            .unwrap_err();
        assert_eq!(err.parse_kind(), Some(ParseErrorKind::InvalidToken));
    }
}
