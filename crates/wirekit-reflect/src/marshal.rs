//! The binary marshaller.
//!
//! A record is encoded as its members, in descriptor order, with nothing
//! in between. Scalars are fixed-width in host byte order, strings are
//! length-prefixed blocks, and a collection is a 4-byte element count
//! followed by each element. There are no tags or names on the wire; both
//! ends must agree on the descriptor.
//!
//! ```rust
//! use std::sync::OnceLock;
//! use wirekit_reflect::{field, marshal, Reflect, TypeDescriptor};
//! use wirekit_stream::{GrowableStream, Stream};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Said {
//!     who: String,
//!     what: String,
//! }
//!
//! impl Reflect for Said {
//!     fn descriptor() -> &'static TypeDescriptor {
//!         static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
//!         DESCRIPTOR.get_or_init(|| {
//!             TypeDescriptor::builder::<Said>("Said")
//!                 .member("who", "speaker", field!(Said, who))
//!                 .member("what", "message", field!(Said, what))
//!                 .build()
//!         })
//!     }
//! }
//!
//! let said = Said { who: "jon".into(), what: "hi".into() };
//! let mut stream = GrowableStream::new();
//! marshal::encode(&said, &mut stream).unwrap();
//! assert_eq!(stream.len(), 4 + 3 + 4 + 2);
//!
//! stream.set_position(0).unwrap();
//! let back: Said = marshal::decode_new(&mut stream).unwrap();
//! assert_eq!(back, said);
//! ```

use std::any::Any;

use wirekit_stream::{Stream, read_u32, write_u32};

use crate::collection::CollectionAdapter;
use crate::descriptor::{Reflect, TypeDescriptor};
use crate::CodecError;

/// Appends the binary form of `value` to `out`.
pub fn encode<T: Reflect>(value: &T, out: &mut dyn Stream) -> Result<(), CodecError> {
    T::descriptor().access().write_binary(value, out)
}

/// Decodes `input` into an existing value.
///
/// Members are overwritten in order. If decoding fails part way, the
/// members already read keep their new values and the rest keep their old
/// ones; the value is still valid and safe to drop or reuse.
pub fn decode<T: Reflect>(value: &mut T, input: &mut dyn Stream) -> Result<(), CodecError> {
    let result = T::descriptor().access().read_binary(value, input);
    if let Err(err) = &result {
        tracing::debug!(
            descriptor = T::descriptor().name(),
            position = input.position(),
            error = %err,
            "binary decode failed"
        );
    }
    result
}

/// Decodes a fresh value from `input`.
pub fn decode_new<T: Reflect>(input: &mut dyn Stream) -> Result<T, CodecError> {
    let mut value = T::default();
    decode(&mut value, input)?;
    Ok(value)
}

pub(crate) fn write_members(
    descriptor: &TypeDescriptor,
    value: &dyn Any,
    out: &mut dyn Stream,
) -> Result<(), CodecError> {
    for member in descriptor.members() {
        member.access().write_binary(value, out)?;
    }
    Ok(())
}

pub(crate) fn read_members(
    descriptor: &TypeDescriptor,
    value: &mut dyn Any,
    input: &mut dyn Stream,
) -> Result<(), CodecError> {
    for member in descriptor.members() {
        member.access().read_binary(value, input)?;
    }
    Ok(())
}

pub(crate) fn write_collection(
    adapter: &dyn CollectionAdapter,
    collection: &dyn Any,
    out: &mut dyn Stream,
) -> Result<(), CodecError> {
    let len = adapter.size(collection)?;
    let count = u32::try_from(len).map_err(|_| CodecError::CollectionTooLarge(len))?;
    write_u32(out, count)?;

    let Some(mut cursor) = adapter.begin_iteration(collection)? else {
        return Ok(());
    };
    loop {
        if let Some(element) = adapter.get_element(&cursor) {
            if let Err(err) = adapter.element().write_binary(element, out) {
                adapter.cleanup(&mut cursor);
                return Err(err);
            }
        }
        if !adapter.increment(&mut cursor) {
            return Ok(());
        }
    }
}

/// Replaces the contents of `collection` with the elements in `input`.
pub(crate) fn read_collection(
    adapter: &dyn CollectionAdapter,
    collection: &mut dyn Any,
    input: &mut dyn Stream,
) -> Result<(), CodecError> {
    let count = read_u32(input)?;
    adapter.clear(collection)?;
    for _ in 0..count {
        adapter.append_from_stream(collection, input)?;
    }
    Ok(())
}
