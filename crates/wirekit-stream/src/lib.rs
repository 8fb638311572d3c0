//! Byte stream layer for wirekit.
//!
//! Provides the [`Stream`] trait, a cursor over bytes that the codec layers
//! read from and write into, plus two implementations:
//!
//! - [`GrowableStream`] — owns its storage and grows on demand. This is what
//!   an encoder writes into before handing the bytes to a transport.
//! - [`SliceStream`] — a read-only view over bytes somebody else owns, for
//!   decoding a received frame in place.
//!
//! The [`block`] helpers layer 4-byte length prefixes on top of any stream.
//! All integers are written in host byte order.

mod block;
mod config;
mod error;
mod growable;
mod slice;

pub use block::{
    MAX_BLOCK_SIZE, read_block_data, read_block_length, read_u32, write_block,
    write_u32,
};
pub use config::StreamConfig;
pub use error::StreamError;
pub use growable::GrowableStream;
pub use slice::SliceStream;

/// A readable and writable byte cursor.
///
/// The cursor sits somewhere between 0 and the logical length. Reads consume
/// bytes after the cursor; writes overwrite at the cursor and extend the
/// logical length when they run past it.
pub trait Stream {
    /// Number of bytes between the cursor and the logical end.
    fn bytes_left(&self) -> usize;

    /// Reads exactly `len` bytes and advances the cursor past them.
    ///
    /// # Errors
    /// [`StreamError::Underflow`] if fewer than `len` bytes remain. The
    /// cursor does not move in that case.
    fn read_bytes(&mut self, len: usize) -> Result<&[u8], StreamError>;

    /// Writes `data` at the cursor and advances past it.
    ///
    /// # Errors
    /// [`StreamError::WriteOnReadOnly`] for read-only streams.
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), StreamError>;

    /// Current cursor position.
    fn position(&self) -> usize;

    /// Moves the cursor.
    ///
    /// # Errors
    /// [`StreamError::InvalidSeek`] if `position` is past the logical length.
    fn set_position(&mut self, position: usize) -> Result<(), StreamError>;
}
