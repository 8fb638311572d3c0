//! Type descriptors: the runtime description of a record type.
//!
//! A descriptor lists a type's members in declaration order. Each member
//! carries a name, a doc string, and a [`MemberAccessor`] that knows how to
//! reach the member inside an owner value and how to encode it. The binary
//! marshaller and the text codec walk this list; neither knows anything
//! about concrete record types.
//!
//! Descriptors are built once per type and live for the rest of the
//! program:
//!
//! ```rust
//! use std::sync::OnceLock;
//! use wirekit_reflect::{field, Reflect, TypeDescriptor};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Login {
//!     version: i32,
//!     name: String,
//! }
//!
//! impl Reflect for Login {
//!     fn descriptor() -> &'static TypeDescriptor {
//!         static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
//!         DESCRIPTOR.get_or_init(|| {
//!             TypeDescriptor::builder::<Login>("Login")
//!                 .member("version", "client version", field!(Login, version))
//!                 .member("name", "user name", field!(Login, name))
//!                 .build()
//!         })
//!     }
//! }
//!
//! let descriptor = Login::descriptor();
//! assert_eq!(descriptor.members().len(), 2);
//! assert_eq!(descriptor.member("name").unwrap().access().type_name(), "alloc::string::String");
//! ```

use std::any::{self, TypeId};
use std::fmt;
use std::marker::PhantomData;

use crate::accessor::MemberAccessor;
use crate::field::Field;
use crate::summary::TypeSummary;

/// A record type with a descriptor.
///
/// Implementing this trait is what makes a type marshallable, printable as
/// text, and usable as a member of other described types.
pub trait Reflect: Default + Send + 'static {
    /// The type's descriptor. Must return the same instance on every call.
    fn descriptor() -> &'static TypeDescriptor;
}

// ---------------------------------------------------------------------------
// TypeDescriptor
// ---------------------------------------------------------------------------

/// Runtime description of a record type.
pub struct TypeDescriptor {
    name: &'static str,
    type_id: TypeId,
    members: Vec<MemberDescriptor>,
    access: MemberAccessor,
}

impl TypeDescriptor {
    /// Starts a descriptor for `T`. Members are added in the order they
    /// should be encoded.
    pub fn builder<T: Reflect>(name: &'static str) -> DescriptorBuilder<T> {
        DescriptorBuilder {
            name,
            members: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// The name given at registration.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The Rust type name of the described type.
    pub fn type_name(&self) -> &'static str {
        self.access.type_name()
    }

    /// In-memory size of the described type.
    pub fn size(&self) -> usize {
        self.access.size()
    }

    /// Members in encoding order.
    pub fn members(&self) -> &[MemberDescriptor] {
        &self.members
    }

    /// Looks up a member by name.
    pub fn member(&self, name: &str) -> Option<&MemberDescriptor> {
        self.members.iter().find(|member| member.name == name)
    }

    /// The accessor for a whole value of this type (offset 0).
    pub fn access(&self) -> &MemberAccessor {
        &self.access
    }

    /// Returns `true` if this descriptor describes `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// A serializable listing of the type and its members.
    pub fn summary(&self) -> TypeSummary {
        TypeSummary::of(self)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("type_name", &self.type_name())
            .field("members", &self.members)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

/// One named member of a described type.
#[derive(Debug)]
pub struct MemberDescriptor {
    name: &'static str,
    doc: MemberDoc,
    access: MemberAccessor,
}

impl MemberDescriptor {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn doc(&self) -> &MemberDoc {
        &self.doc
    }

    pub fn access(&self) -> &MemberAccessor {
        &self.access
    }
}

/// Human-readable documentation attached to a member.
///
/// Numeric members may also advertise the range of values that makes
/// sense for them. The range is informational; codecs do not enforce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberDoc {
    Text(&'static str),
    Range {
        text: &'static str,
        low: i64,
        high: i64,
    },
}

impl MemberDoc {
    pub fn range(text: &'static str, low: i64, high: i64) -> Self {
        Self::Range { text, low, high }
    }

    /// The descriptive text, whichever variant this is.
    pub fn text(&self) -> &'static str {
        match self {
            Self::Text(text) | Self::Range { text, .. } => text,
        }
    }

    /// The advertised `(low, high)` range, if any.
    pub fn bounds(&self) -> Option<(i64, i64)> {
        match self {
            Self::Text(_) => None,
            Self::Range { low, high, .. } => Some((*low, *high)),
        }
    }
}

impl From<&'static str> for MemberDoc {
    fn from(text: &'static str) -> Self {
        Self::Text(text)
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Collects the members of a [`TypeDescriptor`].
///
/// Created by [`TypeDescriptor::builder`]. Member accessors are produced by
/// the [`field!`](crate::field) macro.
pub struct DescriptorBuilder<T> {
    name: &'static str,
    members: Vec<MemberDescriptor>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Reflect> DescriptorBuilder<T> {
    /// Appends a member.
    pub fn member<M, G, GM>(
        mut self,
        name: &'static str,
        doc: impl Into<MemberDoc>,
        field: FieldRef<T, M, G, GM>,
    ) -> Self
    where
        M: Field,
        G: Fn(&T) -> &M + Send + Sync + 'static,
        GM: Fn(&mut T) -> &mut M + Send + Sync + 'static,
    {
        self.members.push(MemberDescriptor {
            name,
            doc: doc.into(),
            access: MemberAccessor::member(field),
        });
        self
    }

    pub fn build(self) -> TypeDescriptor {
        tracing::trace!(
            descriptor = self.name,
            members = self.members.len(),
            "built type descriptor"
        );
        TypeDescriptor {
            name: self.name,
            type_id: TypeId::of::<T>(),
            members: self.members,
            access: MemberAccessor::whole::<T>(),
        }
    }
}

impl<T> fmt::Debug for DescriptorBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorBuilder")
            .field("name", &self.name)
            .field("owner", &any::type_name::<T>())
            .field("members", &self.members.len())
            .finish()
    }
}

/// A typed path from an owner `T` to one of its fields `M`.
///
/// Usually produced by [`field!`](crate::field), which fills in the offset
/// with `offset_of!` and the two projections with field borrows.
pub struct FieldRef<T, M, G, GM> {
    pub(crate) offset: usize,
    pub(crate) get: G,
    pub(crate) get_mut: GM,
    _marker: PhantomData<fn(&T) -> &M>,
}

impl<T, M, G, GM> FieldRef<T, M, G, GM>
where
    T: 'static,
    M: 'static,
    G: Fn(&T) -> &M + Send + Sync + 'static,
    GM: Fn(&mut T) -> &mut M + Send + Sync + 'static,
{
    pub fn new(offset: usize, get: G, get_mut: GM) -> Self {
        Self {
            offset,
            get,
            get_mut,
            _marker: PhantomData,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::OnceLock;

    use super::*;
    use crate::Category;
    use crate::field;

    #[derive(Debug, Default, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
        label: String,
    }

    impl Reflect for Point {
        fn descriptor() -> &'static TypeDescriptor {
            static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
            DESCRIPTOR.get_or_init(|| {
                TypeDescriptor::builder::<Point>("Point")
                    .member("x", "horizontal", field!(Point, x))
                    .member("y", MemberDoc::range("vertical", -10, 10), field!(Point, y))
                    .member("label", "name of the point", field!(Point, label))
                    .build()
            })
        }
    }

    #[test]
    fn test_descriptor_is_a_single_instance() {
        assert!(std::ptr::eq(Point::descriptor(), Point::descriptor()));
    }

    #[test]
    fn test_members_keep_declaration_order() {
        let names: Vec<_> = Point::descriptor()
            .members()
            .iter()
            .map(MemberDescriptor::name)
            .collect();
        assert_eq!(names, ["x", "y", "label"]);
    }

    #[test]
    fn test_member_offsets_and_sizes() {
        let descriptor = Point::descriptor();
        let y = descriptor.member("y").unwrap();
        assert_eq!(y.access().offset(), std::mem::offset_of!(Point, y));
        assert_eq!(y.access().size(), 4);
        assert_eq!(descriptor.size(), std::mem::size_of::<Point>());
        assert_eq!(descriptor.access().offset(), 0);
    }

    #[test]
    fn test_self_accessor_is_compound() {
        let descriptor = Point::descriptor();
        match descriptor.access().category() {
            Category::Compound(inner) => assert!(std::ptr::eq(inner, descriptor)),
            other => panic!("expected compound, got {other:?}"),
        }
    }

    #[test]
    fn test_type_identity() {
        let descriptor = Point::descriptor();
        assert!(descriptor.is::<Point>());
        assert!(!descriptor.is::<i32>());
        assert_eq!(descriptor.name(), "Point");
        assert!(descriptor.type_name().ends_with("Point"));
    }

    #[test]
    fn test_member_doc_variants() {
        let descriptor = Point::descriptor();
        let x = descriptor.member("x").unwrap().doc();
        let y = descriptor.member("y").unwrap().doc();
        assert_eq!(x.text(), "horizontal");
        assert_eq!(x.bounds(), None);
        assert_eq!(y.text(), "vertical");
        assert_eq!(y.bounds(), Some((-10, 10)));
    }

    #[test]
    fn test_unknown_member_lookup() {
        assert!(Point::descriptor().member("z").is_none());
    }
}
