//! A read-only stream over borrowed bytes.

use crate::{Stream, StreamError};

/// Reads from a byte slice owned by someone else, typically a received
/// frame. Writes always fail with [`StreamError::WriteOnReadOnly`].
#[derive(Debug, Clone)]
pub struct SliceStream<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceStream<'a> {
    /// Creates a stream positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// The bytes not yet read.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Total length of the underlying slice.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the underlying slice is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Stream for SliceStream<'_> {
    fn bytes_left(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_bytes(&mut self, len: usize) -> Result<&[u8], StreamError> {
        let available = self.bytes_left();
        if len > available {
            return Err(StreamError::Underflow {
                requested: len,
                available,
            });
        }
        let start = self.pos;
        self.pos += len;
        Ok(&self.data[start..self.pos])
    }

    fn write_bytes(&mut self, _data: &[u8]) -> Result<(), StreamError> {
        Err(StreamError::WriteOnReadOnly)
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn set_position(&mut self, position: usize) -> Result<(), StreamError> {
        if position > self.data.len() {
            return Err(StreamError::InvalidSeek {
                position,
                length: self.data.len(),
            });
        }
        self.pos = position;
        Ok(())
    }
}
