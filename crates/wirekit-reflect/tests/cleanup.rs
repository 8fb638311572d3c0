//! A collection walk that fails part way still releases its cursor.
//!
//! `Ledger` is a custom container whose iterator counts how many walks are
//! alive, and `Entry` is a custom scalar that refuses to encode zero in
//! binary. The marshaller must report the element's error and leave no walk
//! behind; every walk, failed or not, ends released.

use std::cell::Cell;
use std::sync::OnceLock;

use wirekit_reflect::{
    CodecError, Container, Field, Reflect, Scalar, Shape, TextReader, TypeDescriptor, field,
    marshal, text,
};
use wirekit_stream::{GrowableStream, Stream, StreamError};

thread_local! {
    static LIVE_WALKS: Cell<usize> = const { Cell::new(0) };
    static STARTED_WALKS: Cell<usize> = const { Cell::new(0) };
}

// ---------------------------------------------------------------------------
// A scalar that fails on zero
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Entry(u8);

impl Field for Entry {
    fn shape() -> Shape {
        Shape::scalar::<Entry>()
    }
}

impl Scalar for Entry {
    fn write_binary(&self, out: &mut dyn Stream) -> Result<(), CodecError> {
        if self.0 == 0 {
            return Err(StreamError::WriteOnReadOnly.into());
        }
        self.0.write_binary(out)
    }

    fn read_binary(&mut self, input: &mut dyn Stream) -> Result<(), CodecError> {
        self.0.read_binary(input)
    }

    fn write_text(&self, out: &mut String) {
        self.0.write_text(out);
    }

    fn read_text(&mut self, input: &mut TextReader<'_>) -> Result<(), CodecError> {
        self.0.read_text(input)
    }
}

// ---------------------------------------------------------------------------
// A container that tracks its walks
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Ledger(Vec<Entry>);

struct Walk<'a> {
    inner: std::slice::Iter<'a, Entry>,
}

impl<'a> Walk<'a> {
    fn new(inner: std::slice::Iter<'a, Entry>) -> Self {
        STARTED_WALKS.with(|n| n.set(n.get() + 1));
        LIVE_WALKS.with(|n| n.set(n.get() + 1));
        Self { inner }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Entry;

    fn next(&mut self) -> Option<&'a Entry> {
        self.inner.next()
    }
}

impl Drop for Walk<'_> {
    fn drop(&mut self) {
        LIVE_WALKS.with(|n| n.set(n.get() - 1));
    }
}

impl Container for Ledger {
    type Element = Entry;

    fn len(&self) -> usize {
        self.0.len()
    }

    fn iter_elements<'a>(&'a self) -> Box<dyn Iterator<Item = &'a Entry> + 'a> {
        Box::new(Walk::new(self.0.iter()))
    }

    fn clear(&mut self) {
        self.0.clear();
    }

    fn insert(&mut self, element: Entry) {
        self.0.push(element);
    }
}

impl Field for Ledger {
    fn shape() -> Shape {
        Shape::collection::<Ledger>()
    }
}

#[derive(Debug, Default)]
struct Account {
    entries: Ledger,
}

impl Reflect for Account {
    fn descriptor() -> &'static TypeDescriptor {
        static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            TypeDescriptor::builder::<Account>("Account")
                .member("entries", "ledger entries", field!(Account, entries))
                .build()
        })
    }
}

fn account(values: &[u8]) -> Account {
    Account {
        entries: Ledger(values.iter().copied().map(Entry).collect()),
    }
}

fn reset_walks() {
    STARTED_WALKS.with(|n| n.set(0));
    LIVE_WALKS.with(|n| n.set(0));
}

fn walks() -> (usize, usize) {
    (STARTED_WALKS.with(Cell::get), LIVE_WALKS.with(Cell::get))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn test_binary_failure_on_second_element_releases_cursor() {
    reset_walks();
    let mut stream = GrowableStream::new();
    let err = marshal::encode(&account(&[7, 0, 9]), &mut stream).unwrap_err();

    assert_eq!(err, CodecError::Stream(StreamError::WriteOnReadOnly));
    assert_eq!(walks(), (1, 0));
    // The count and the first element made it out before the failure.
    let mut expected = 3u32.to_ne_bytes().to_vec();
    expected.push(7);
    assert_eq!(stream.as_bytes(), &expected[..]);
}

#[test]
fn test_binary_success_releases_cursor() {
    reset_walks();
    let mut stream = GrowableStream::new();
    marshal::encode(&account(&[1, 2]), &mut stream).unwrap();
    assert_eq!(walks(), (1, 0));

    stream.set_position(0).unwrap();
    let back: Account = marshal::decode_new(&mut stream).unwrap();
    assert_eq!(back.entries.0, [Entry(1), Entry(2)]);
}

#[test]
fn test_empty_collection_starts_no_lasting_walk() {
    reset_walks();
    let mut stream = GrowableStream::new();
    marshal::encode(&account(&[]), &mut stream).unwrap();
    assert_eq!(walks().1, 0);
}

#[test]
fn test_text_walk_releases_cursor() {
    reset_walks();
    assert_eq!(text::to_text(&account(&[3, 0])).unwrap(), "[ { 3 0 } ] ");
    assert_eq!(walks(), (1, 0));
}
