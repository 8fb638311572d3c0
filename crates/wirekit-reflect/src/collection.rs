//! Uniform access to sequence-like members.
//!
//! The codecs never see a concrete collection type. They talk to a
//! [`CollectionAdapter`], which can count elements, walk them with a
//! [`Cursor`], clear the collection, and append one decoded element at a
//! time. Adapters are produced from the typed [`Container`] trait, which is
//! implemented for the standard sequences and sets.

use std::any::{self, Any};
use std::collections::{BTreeSet, HashSet, LinkedList, VecDeque};
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

use wirekit_stream::Stream;

use crate::accessor::{MemberAccessor, Shape};
use crate::field::Field;
use crate::text::TextReader;
use crate::CodecError;

// ---------------------------------------------------------------------------
// Container: the typed side
// ---------------------------------------------------------------------------

/// A collection type whose elements can be described.
///
/// `insert` appends for sequences. Sets keep their uniqueness rule, so
/// inserting a duplicate is a no-op there.
pub trait Container: Default + Send + 'static {
    type Element: Field;

    fn len(&self) -> usize;

    fn iter_elements<'a>(&'a self) -> Box<dyn Iterator<Item = &'a Self::Element> + 'a>;

    fn clear(&mut self);

    fn insert(&mut self, element: Self::Element);
}

impl<E: Field> Container for Vec<E> {
    type Element = E;

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn iter_elements<'a>(&'a self) -> Box<dyn Iterator<Item = &'a E> + 'a> {
        Box::new(self.iter())
    }

    fn clear(&mut self) {
        Vec::clear(self);
    }

    fn insert(&mut self, element: E) {
        self.push(element);
    }
}

impl<E: Field> Container for VecDeque<E> {
    type Element = E;

    fn len(&self) -> usize {
        VecDeque::len(self)
    }

    fn iter_elements<'a>(&'a self) -> Box<dyn Iterator<Item = &'a E> + 'a> {
        Box::new(self.iter())
    }

    fn clear(&mut self) {
        VecDeque::clear(self);
    }

    fn insert(&mut self, element: E) {
        self.push_back(element);
    }
}

impl<E: Field> Container for LinkedList<E> {
    type Element = E;

    fn len(&self) -> usize {
        LinkedList::len(self)
    }

    fn iter_elements<'a>(&'a self) -> Box<dyn Iterator<Item = &'a E> + 'a> {
        Box::new(self.iter())
    }

    fn clear(&mut self) {
        LinkedList::clear(self);
    }

    fn insert(&mut self, element: E) {
        self.push_back(element);
    }
}

impl<E: Field + Ord> Container for BTreeSet<E> {
    type Element = E;

    fn len(&self) -> usize {
        BTreeSet::len(self)
    }

    fn iter_elements<'a>(&'a self) -> Box<dyn Iterator<Item = &'a E> + 'a> {
        Box::new(self.iter())
    }

    fn clear(&mut self) {
        BTreeSet::clear(self);
    }

    fn insert(&mut self, element: E) {
        BTreeSet::insert(self, element);
    }
}

impl<E: Field + Eq + Hash> Container for HashSet<E> {
    type Element = E;

    fn len(&self) -> usize {
        HashSet::len(self)
    }

    fn iter_elements<'a>(&'a self) -> Box<dyn Iterator<Item = &'a E> + 'a> {
        Box::new(self.iter())
    }

    fn clear(&mut self) {
        HashSet::clear(self);
    }

    fn insert(&mut self, element: E) {
        HashSet::insert(self, element);
    }
}

impl<E: Field> Field for Vec<E> {
    fn shape() -> Shape {
        Shape::collection::<Self>()
    }
}

impl<E: Field> Field for VecDeque<E> {
    fn shape() -> Shape {
        Shape::collection::<Self>()
    }
}

impl<E: Field> Field for LinkedList<E> {
    fn shape() -> Shape {
        Shape::collection::<Self>()
    }
}

impl<E: Field + Ord> Field for BTreeSet<E> {
    fn shape() -> Shape {
        Shape::collection::<Self>()
    }
}

impl<E: Field + Eq + Hash> Field for HashSet<E> {
    fn shape() -> Shape {
        Shape::collection::<Self>()
    }
}

// ---------------------------------------------------------------------------
// Cursor
// ---------------------------------------------------------------------------

/// Position of an in-progress walk over a collection.
///
/// The cursor owns the iterator state. It is released when the walk runs
/// off the end, when [`release`](Self::release) is called, or when the
/// cursor is dropped, whichever happens first.
pub struct Cursor<'a> {
    current: Option<&'a dyn Any>,
    rest: Option<Box<dyn Iterator<Item = &'a dyn Any> + 'a>>,
}

impl<'a> Cursor<'a> {
    /// Starts a walk. Returns `None` for an empty iterator.
    pub fn new(mut elements: Box<dyn Iterator<Item = &'a dyn Any> + 'a>) -> Option<Self> {
        let first = elements.next()?;
        Some(Self {
            current: Some(first),
            rest: Some(elements),
        })
    }

    /// The element under the cursor, or `None` once released.
    pub fn element(&self) -> Option<&'a dyn Any> {
        self.current
    }

    /// Moves to the next element. Returns `false`, and releases the
    /// cursor, when there is none.
    pub fn advance(&mut self) -> bool {
        match self.rest.as_mut().and_then(|rest| rest.next()) {
            Some(next) => {
                self.current = Some(next);
                true
            }
            None => {
                self.release();
                false
            }
        }
    }

    /// Drops the iterator state. Calling this more than once is harmless.
    pub fn release(&mut self) {
        self.current = None;
        self.rest = None;
    }

    pub fn is_released(&self) -> bool {
        self.rest.is_none()
    }
}

impl fmt::Debug for Cursor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("released", &self.is_released())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// CollectionAdapter: the type-erased side
// ---------------------------------------------------------------------------

/// Type-erased operations on one collection type.
///
/// Every method taking `collection` fails with
/// [`CodecError::TypeMismatch`] if it is not the adapter's collection type.
pub trait CollectionAdapter: Send + Sync {
    /// Accessor for a single element, used to encode and decode elements.
    fn element(&self) -> &MemberAccessor;

    /// Rust type name of the collection.
    fn type_name(&self) -> &'static str;

    fn size(&self, collection: &dyn Any) -> Result<usize, CodecError>;

    /// Starts a walk over the elements. `None` means the collection is
    /// empty and there is nothing to clean up.
    fn begin_iteration<'a>(
        &self,
        collection: &'a dyn Any,
    ) -> Result<Option<Cursor<'a>>, CodecError>;

    fn get_element<'a>(&self, cursor: &Cursor<'a>) -> Option<&'a dyn Any> {
        cursor.element()
    }

    /// Advances the walk. Returns `false` once the end is reached, at which
    /// point the cursor has been released.
    fn increment(&self, cursor: &mut Cursor<'_>) -> bool {
        cursor.advance()
    }

    /// Ends a walk early.
    fn cleanup(&self, cursor: &mut Cursor<'_>) {
        cursor.release();
    }

    fn clear(&self, collection: &mut dyn Any) -> Result<(), CodecError>;

    /// Decodes one element from `input` and inserts it.
    fn append_from_stream(
        &self,
        collection: &mut dyn Any,
        input: &mut dyn Stream,
    ) -> Result<(), CodecError>;

    /// Parses one element from `input` and inserts it.
    fn append_from_text(
        &self,
        collection: &mut dyn Any,
        input: &mut TextReader<'_>,
    ) -> Result<(), CodecError>;
}

/// The adapter for a [`Container`] type.
pub(crate) struct ContainerAdapter<C> {
    element: MemberAccessor,
    _marker: PhantomData<fn() -> C>,
}

impl<C: Container> ContainerAdapter<C> {
    pub(crate) fn new() -> Self {
        Self {
            element: MemberAccessor::whole::<C::Element>(),
            _marker: PhantomData,
        }
    }

    fn typed<'a>(&self, collection: &'a dyn Any) -> Result<&'a C, CodecError> {
        collection.downcast_ref::<C>().ok_or(CodecError::TypeMismatch {
            expected: any::type_name::<C>(),
        })
    }

    fn typed_mut<'a>(&self, collection: &'a mut dyn Any) -> Result<&'a mut C, CodecError> {
        collection.downcast_mut::<C>().ok_or(CodecError::TypeMismatch {
            expected: any::type_name::<C>(),
        })
    }
}

impl<C: Container> CollectionAdapter for ContainerAdapter<C> {
    fn element(&self) -> &MemberAccessor {
        &self.element
    }

    fn type_name(&self) -> &'static str {
        any::type_name::<C>()
    }

    fn size(&self, collection: &dyn Any) -> Result<usize, CodecError> {
        Ok(self.typed(collection)?.len())
    }

    fn begin_iteration<'a>(
        &self,
        collection: &'a dyn Any,
    ) -> Result<Option<Cursor<'a>>, CodecError> {
        let elements = self
            .typed(collection)?
            .iter_elements()
            .map(|element| element as &dyn Any);
        Ok(Cursor::new(Box::new(elements)))
    }

    fn clear(&self, collection: &mut dyn Any) -> Result<(), CodecError> {
        self.typed_mut(collection)?.clear();
        Ok(())
    }

    fn append_from_stream(
        &self,
        collection: &mut dyn Any,
        input: &mut dyn Stream,
    ) -> Result<(), CodecError> {
        let collection = self.typed_mut(collection)?;
        let mut element = C::Element::default();
        self.element.read_binary(&mut element, input)?;
        collection.insert(element);
        Ok(())
    }

    fn append_from_text(
        &self,
        collection: &mut dyn Any,
        input: &mut TextReader<'_>,
    ) -> Result<(), CodecError> {
        let collection = self.typed_mut(collection)?;
        let mut element = C::Element::default();
        self.element.read_text(&mut element, input)?;
        collection.insert(element);
        Ok(())
    }
}
