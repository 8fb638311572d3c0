//! Member accessors: typed operations behind a type-erased interface.
//!
//! A [`MemberAccessor`] is built from a concrete owner and member type, then
//! stored in a descriptor where both types are forgotten. Its operations take
//! the *owner* as `&dyn Any`, project to the member, and encode, decode, or
//! reset it. Handing an accessor a value of the wrong type is an error, not
//! undefined behavior.

use std::any::{self, Any};
use std::fmt;
use std::marker::PhantomData;
use std::mem;

use wirekit_stream::Stream;

use crate::collection::{CollectionAdapter, Container, ContainerAdapter};
use crate::descriptor::{FieldRef, Reflect, TypeDescriptor};
use crate::field::{Field, Scalar};
use crate::text::TextReader;
use crate::{CodecError, marshal, text};

// ---------------------------------------------------------------------------
// Shape and Category
// ---------------------------------------------------------------------------

/// How a member type is encoded. Returned by [`Field::shape`].
pub struct Shape(pub(crate) ShapeKind);

pub(crate) enum ShapeKind {
    Scalar(Box<dyn ScalarOps>),
    /// Resolved on use so that a type can hold collections of itself.
    Compound(fn() -> &'static TypeDescriptor),
    Collection(Box<dyn CollectionAdapter>),
}

impl Shape {
    /// A leaf encoded by its [`Scalar`] impl.
    pub fn scalar<M: Scalar>() -> Self {
        Self(ShapeKind::Scalar(Box::new(ScalarCodec::<M>(PhantomData))))
    }

    /// A nested record encoded member by member.
    pub fn compound<T: Reflect>() -> Self {
        Self(ShapeKind::Compound(T::descriptor))
    }

    /// A sequence encoded as a count followed by its elements.
    pub fn collection<C: Container>() -> Self {
        Self(ShapeKind::Collection(Box::new(ContainerAdapter::<C>::new())))
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.0 {
            ShapeKind::Scalar(_) => "scalar",
            ShapeKind::Compound(_) => "compound",
            ShapeKind::Collection(_) => "collection",
        };
        f.debug_tuple("Shape").field(&kind).finish()
    }
}

/// The category of a member, as seen by introspection.
#[derive(Clone, Copy)]
pub enum Category<'a> {
    Scalar,
    Compound(&'static TypeDescriptor),
    Collection(&'a dyn CollectionAdapter),
}

impl Category<'_> {
    pub fn is_compound(&self) -> bool {
        matches!(self, Self::Compound(_))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Self::Collection(_))
    }
}

impl fmt::Debug for Category<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar => write!(f, "Scalar"),
            Self::Compound(descriptor) => {
                f.debug_tuple("Compound").field(&descriptor.name()).finish()
            }
            Self::Collection(adapter) => f
                .debug_tuple("Collection")
                .field(&adapter.element().type_name())
                .finish(),
        }
    }
}

// ---------------------------------------------------------------------------
// Type-erased building blocks
// ---------------------------------------------------------------------------

/// Leaf encoding for one scalar type.
pub(crate) trait ScalarOps: Send + Sync {
    fn write_binary(&self, value: &dyn Any, out: &mut dyn Stream) -> Result<(), CodecError>;
    fn read_binary(&self, value: &mut dyn Any, input: &mut dyn Stream) -> Result<(), CodecError>;
    fn write_text(&self, value: &dyn Any, out: &mut String) -> Result<(), CodecError>;
    fn read_text(&self, value: &mut dyn Any, input: &mut TextReader<'_>)
    -> Result<(), CodecError>;
}

struct ScalarCodec<M>(PhantomData<fn() -> M>);

impl<M: Scalar> ScalarCodec<M> {
    fn mismatch() -> CodecError {
        CodecError::TypeMismatch {
            expected: any::type_name::<M>(),
        }
    }
}

impl<M: Scalar> ScalarOps for ScalarCodec<M> {
    fn write_binary(&self, value: &dyn Any, out: &mut dyn Stream) -> Result<(), CodecError> {
        value
            .downcast_ref::<M>()
            .ok_or_else(Self::mismatch)?
            .write_binary(out)
    }

    fn read_binary(&self, value: &mut dyn Any, input: &mut dyn Stream) -> Result<(), CodecError> {
        value
            .downcast_mut::<M>()
            .ok_or_else(Self::mismatch)?
            .read_binary(input)
    }

    fn write_text(&self, value: &dyn Any, out: &mut String) -> Result<(), CodecError> {
        value
            .downcast_ref::<M>()
            .ok_or_else(Self::mismatch)?
            .write_text(out);
        Ok(())
    }

    fn read_text(
        &self,
        value: &mut dyn Any,
        input: &mut TextReader<'_>,
    ) -> Result<(), CodecError> {
        value
            .downcast_mut::<M>()
            .ok_or_else(Self::mismatch)?
            .read_text(input)
    }
}

/// Maps an owner value to one of its members.
pub(crate) trait Projection: Send + Sync {
    fn project<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn Any>;
    fn project_mut<'a>(&self, owner: &'a mut dyn Any) -> Option<&'a mut dyn Any>;
}

impl<T, M, G, GM> Projection for FieldRef<T, M, G, GM>
where
    T: 'static,
    M: 'static,
    G: Fn(&T) -> &M + Send + Sync + 'static,
    GM: Fn(&mut T) -> &mut M + Send + Sync + 'static,
{
    fn project<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn Any> {
        let owner = owner.downcast_ref::<T>()?;
        let member: &'a dyn Any = (self.get)(owner);
        Some(member)
    }

    fn project_mut<'a>(&self, owner: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        let owner = owner.downcast_mut::<T>()?;
        let member: &'a mut dyn Any = (self.get_mut)(owner);
        Some(member)
    }
}

/// The identity projection, for accessors that address a whole value.
struct Whole<T>(PhantomData<fn() -> T>);

impl<T: 'static> Projection for Whole<T> {
    fn project<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn Any> {
        owner.is::<T>().then_some(owner)
    }

    fn project_mut<'a>(&self, owner: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        if owner.is::<T>() { Some(owner) } else { None }
    }
}

/// Lifecycle of a member value: default construction and release.
trait ValueOps: Send + Sync {
    fn create(&self) -> Box<dyn Any + Send>;
    fn reset(&self, slot: &mut dyn Any) -> bool;
    fn matches(&self, value: &dyn Any) -> bool;
}

struct Lifecycle<M>(PhantomData<fn() -> M>);

impl<M: Default + Send + 'static> ValueOps for Lifecycle<M> {
    fn create(&self) -> Box<dyn Any + Send> {
        Box::new(M::default())
    }

    fn reset(&self, slot: &mut dyn Any) -> bool {
        match slot.downcast_mut::<M>() {
            Some(value) => {
                *value = M::default();
                true
            }
            None => false,
        }
    }

    fn matches(&self, value: &dyn Any) -> bool {
        value.is::<M>()
    }
}

// ---------------------------------------------------------------------------
// MemberAccessor
// ---------------------------------------------------------------------------

/// Type-erased operations on one member of an owner value.
pub struct MemberAccessor {
    size: usize,
    offset: usize,
    type_name: &'static str,
    owner_name: &'static str,
    shape: ShapeKind,
    projection: Box<dyn Projection>,
    value: Box<dyn ValueOps>,
}

impl MemberAccessor {
    /// An accessor whose owner is the value itself.
    pub(crate) fn whole<M: Field>() -> Self {
        Self {
            size: mem::size_of::<M>(),
            offset: 0,
            type_name: any::type_name::<M>(),
            owner_name: any::type_name::<M>(),
            shape: M::shape().0,
            projection: Box::new(Whole::<M>(PhantomData)),
            value: Box::new(Lifecycle::<M>(PhantomData)),
        }
    }

    /// An accessor for field `M` of owner `T`.
    pub(crate) fn member<T, M, G, GM>(field: FieldRef<T, M, G, GM>) -> Self
    where
        T: 'static,
        M: Field,
        G: Fn(&T) -> &M + Send + Sync + 'static,
        GM: Fn(&mut T) -> &mut M + Send + Sync + 'static,
    {
        Self {
            size: mem::size_of::<M>(),
            offset: field.offset,
            type_name: any::type_name::<M>(),
            owner_name: any::type_name::<T>(),
            shape: M::shape().0,
            projection: Box::new(field),
            value: Box::new(Lifecycle::<M>(PhantomData)),
        }
    }

    /// Size in bytes of the member type.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Byte offset of the member inside its owner.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Rust type name of the member type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn category(&self) -> Category<'_> {
        match &self.shape {
            ShapeKind::Scalar(_) => Category::Scalar,
            ShapeKind::Compound(descriptor) => Category::Compound(descriptor()),
            ShapeKind::Collection(adapter) => Category::Collection(adapter.as_ref()),
        }
    }

    /// Resets the member of `owner` to its default value.
    pub fn construct(&self, owner: &mut dyn Any) -> Result<(), CodecError> {
        let slot = self.target_mut(owner)?;
        if self.value.reset(slot) {
            Ok(())
        } else {
            Err(self.member_mismatch())
        }
    }

    /// Releases whatever the member of `owner` holds, leaving a default
    /// value behind.
    pub fn destroy(&self, owner: &mut dyn Any) -> Result<(), CodecError> {
        self.construct(owner)
    }

    /// A fresh default value of the member type.
    pub fn create(&self) -> Box<dyn Any + Send> {
        self.value.create()
    }

    /// Drops a value produced by [`create`](Self::create), after checking
    /// that it really is of the member type.
    pub fn destroy_boxed(&self, value: Box<dyn Any + Send>) -> Result<(), CodecError> {
        if !self.value.matches(&*value) {
            return Err(self.member_mismatch());
        }
        drop(value);
        Ok(())
    }

    /// Appends the binary form of the member of `owner` to `out`.
    pub fn write_binary(&self, owner: &dyn Any, out: &mut dyn Stream) -> Result<(), CodecError> {
        let value = self.target(owner)?;
        match &self.shape {
            ShapeKind::Scalar(ops) => ops.write_binary(value, out),
            ShapeKind::Compound(descriptor) => marshal::write_members(descriptor(), value, out),
            ShapeKind::Collection(adapter) => {
                marshal::write_collection(adapter.as_ref(), value, out)
            }
        }
    }

    /// Replaces the member of `owner` with a value decoded from `input`.
    pub fn read_binary(
        &self,
        owner: &mut dyn Any,
        input: &mut dyn Stream,
    ) -> Result<(), CodecError> {
        let value = self.target_mut(owner)?;
        match &self.shape {
            ShapeKind::Scalar(ops) => ops.read_binary(value, input),
            ShapeKind::Compound(descriptor) => marshal::read_members(descriptor(), value, input),
            ShapeKind::Collection(adapter) => {
                marshal::read_collection(adapter.as_ref(), value, input)
            }
        }
    }

    /// Appends the text form of the member of `owner` to `out`.
    pub fn write_text(&self, owner: &dyn Any, out: &mut String) -> Result<(), CodecError> {
        let value = self.target(owner)?;
        match &self.shape {
            ShapeKind::Scalar(ops) => {
                ops.write_text(value, out)?;
                out.push(' ');
                Ok(())
            }
            ShapeKind::Compound(descriptor) => text::write_members(descriptor(), value, out),
            ShapeKind::Collection(adapter) => text::write_collection(adapter.as_ref(), value, out),
        }
    }

    /// Replaces the member of `owner` with a value parsed from `input`.
    pub fn read_text(
        &self,
        owner: &mut dyn Any,
        input: &mut TextReader<'_>,
    ) -> Result<(), CodecError> {
        let value = self.target_mut(owner)?;
        match &self.shape {
            ShapeKind::Scalar(ops) => {
                input.skip_whitespace();
                ops.read_text(value, input)
            }
            ShapeKind::Compound(descriptor) => text::read_members(descriptor(), value, input),
            ShapeKind::Collection(adapter) => text::read_collection(adapter.as_ref(), value, input),
        }
    }

    fn target<'a>(&self, owner: &'a dyn Any) -> Result<&'a dyn Any, CodecError> {
        self.projection
            .project(owner)
            .ok_or(CodecError::TypeMismatch {
                expected: self.owner_name,
            })
    }

    fn target_mut<'a>(&self, owner: &'a mut dyn Any) -> Result<&'a mut dyn Any, CodecError> {
        self.projection
            .project_mut(owner)
            .ok_or(CodecError::TypeMismatch {
                expected: self.owner_name,
            })
    }

    fn member_mismatch(&self) -> CodecError {
        CodecError::TypeMismatch {
            expected: self.type_name,
        }
    }
}

impl fmt::Debug for MemberAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberAccessor")
            .field("type_name", &self.type_name)
            .field("offset", &self.offset)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}
