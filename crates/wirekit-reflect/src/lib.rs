//! Runtime type descriptors and the codecs built on them.
//!
//! This crate turns plain Rust records into something that can be walked
//! generically:
//!
//! - **Descriptors** ([`Reflect`], [`TypeDescriptor`], [`field!`]) —
//!   the ordered list of a type's members, built once per type.
//! - **Accessors** ([`MemberAccessor`], [`Field`], [`Scalar`]) — typed
//!   member operations behind a type-erased interface.
//! - **Collections** ([`Container`], [`CollectionAdapter`], [`Cursor`]) —
//!   uniform access to `Vec`, `VecDeque`, `LinkedList`, `BTreeSet` and
//!   `HashSet` members.
//! - **Codecs** ([`marshal`], [`text`], the [`Codec`] trait) — the compact
//!   binary form and the bracketed text form.
//!
//! # Architecture
//!
//! ```text
//! Stream (bytes) → Reflect (records) → Protocol (coded messages)
//! ```
//!
//! Nothing here knows about message codes or dispatch; that lives one
//! layer up.

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod accessor;
mod codec;
mod collection;
mod descriptor;
mod error;
mod field;
mod summary;

pub mod marshal;
pub mod text;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use accessor::{Category, MemberAccessor, Shape};
pub use codec::{BinaryCodec, Codec, TextCodec};
pub use collection::{CollectionAdapter, Container, Cursor};
pub use descriptor::{
    DescriptorBuilder, FieldRef, MemberDescriptor, MemberDoc, Reflect, TypeDescriptor,
};
pub use error::{CodecError, ParseError, ParseErrorKind};
pub use field::{Field, Scalar};
pub use summary::{MemberKind, MemberSummary, TypeSummary};
pub use text::TextReader;

/// Builds the [`FieldRef`] for member `field` of type `owner`.
///
/// ```rust
/// # use std::sync::OnceLock;
/// # use wirekit_reflect::{field, Reflect, TypeDescriptor};
/// #[derive(Default)]
/// struct Said {
///     who: String,
/// }
///
/// # impl Reflect for Said {
/// #     fn descriptor() -> &'static TypeDescriptor {
/// #         static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
/// #         DESCRIPTOR.get_or_init(|| {
/// let descriptor = TypeDescriptor::builder::<Said>("Said")
///     .member("who", "speaker", field!(Said, who))
///     .build();
/// #             descriptor
/// #         })
/// #     }
/// # }
/// ```
#[macro_export]
macro_rules! field {
    ($owner:ty, $field:ident) => {
        $crate::FieldRef::new(
            ::core::mem::offset_of!($owner, $field),
            |value: &$owner| &value.$field,
            |value: &mut $owner| &mut value.$field,
        )
    };
}
