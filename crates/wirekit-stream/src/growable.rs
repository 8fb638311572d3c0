//! A stream that owns and grows its backing buffer.

use crate::{Stream, StreamConfig, StreamError};

/// An owned, growable byte stream.
///
/// Keeps three sizes apart:
///
/// ```text
/// 0 ........ position ........ len ........ capacity
///            (cursor)      (logical end)   (physical buffer)
/// ```
///
/// Writes past the physical end reallocate according to [`StreamConfig`].
/// Writes past the logical end extend it. [`truncate_at_cursor`] pulls the
/// logical end back to the cursor and may give memory back.
///
/// [`truncate_at_cursor`]: GrowableStream::truncate_at_cursor
#[derive(Debug)]
pub struct GrowableStream {
    /// Physical buffer. `buf.len()` is the physical size; bytes past `len`
    /// are scratch.
    buf: Vec<u8>,
    len: usize,
    pos: usize,
    config: StreamConfig,
}

impl GrowableStream {
    /// Creates an empty stream with the default sizing policy.
    pub fn new() -> Self {
        Self::with_config(StreamConfig::default())
    }

    /// Creates an empty stream with a custom sizing policy.
    pub fn with_config(config: StreamConfig) -> Self {
        Self {
            buf: Vec::new(),
            len: 0,
            pos: 0,
            config,
        }
    }

    /// Wraps existing bytes. The cursor starts at 0, ready for reading.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let len = bytes.len();
        Self {
            buf: bytes,
            len,
            pos: 0,
            config: StreamConfig::default(),
        }
    }

    /// The logical contents.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Consumes the stream and returns the logical contents.
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.buf.truncate(self.len);
        self.buf
    }

    /// Logical length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the stream holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Physical size of the backing buffer.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// The sizing policy in use.
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Empties the stream but keeps the buffer for reuse.
    pub fn clear(&mut self) {
        self.len = 0;
        self.pos = 0;
    }

    /// Makes the cursor the new logical end.
    ///
    /// When the buffer is now more than twice the logical length and larger
    /// than [`StreamConfig::shrink_floor`], it is reallocated down to the
    /// logical length rounded up to the alignment. This bounds the memory
    /// held by a stream that was used for one large message and then
    /// rewound for small ones.
    pub fn truncate_at_cursor(&mut self) {
        self.len = self.pos;
        let phys = self.buf.len();
        if phys > self.len.saturating_mul(2) && phys > self.config.shrink_floor {
            let shrunk = self.config.round_up(self.len);
            tracing::trace!(from = phys, to = shrunk, "shrinking stream buffer");
            self.buf.truncate(shrunk);
            self.buf.shrink_to_fit();
        }
    }

    fn reserve_for(&mut self, end: usize) {
        let mut phys = self.buf.len();
        if end <= phys {
            return;
        }
        while phys < end {
            phys = self.config.grow(phys);
        }
        tracing::trace!(from = self.buf.len(), to = phys, "growing stream buffer");
        self.buf.reserve_exact(phys - self.buf.len());
        self.buf.resize(phys, 0);
    }
}

impl Default for GrowableStream {
    fn default() -> Self {
        Self::new()
    }
}

/// Copies the logical contents into a right-sized buffer. The copy's cursor
/// starts at 0.
impl Clone for GrowableStream {
    fn clone(&self) -> Self {
        let mut buf = vec![0; self.config.round_up(self.len)];
        buf[..self.len].copy_from_slice(self.as_bytes());
        Self {
            buf,
            len: self.len,
            pos: 0,
            config: self.config.clone(),
        }
    }
}

impl Stream for GrowableStream {
    fn bytes_left(&self) -> usize {
        self.len - self.pos
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
        Ok(&self.buf[start..self.pos])
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<(), StreamError> {
        let end = self.pos + data.len();
        self.reserve_for(end);
        self.buf[self.pos..end].copy_from_slice(data);
        self.pos = end;
        self.len = self.len.max(end);
        Ok(())
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn set_position(&mut self, position: usize) -> Result<(), StreamError> {
        if position > self.len {
            return Err(StreamError::InvalidSeek {
                position,
                length: self.len,
            });
        }
        self.pos = position;
        Ok(())
    }
}
