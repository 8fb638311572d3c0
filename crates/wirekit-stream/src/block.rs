//! Fixed-width integers and length-prefixed blocks.
//!
//! A block is a 4-byte length followed by that many raw bytes. Strings and
//! other variable-length payloads travel as blocks.

use crate::{Stream, StreamError};

/// Largest block accepted in either direction (32 MiB).
///
/// Anything larger is treated as a corrupt length field rather than an
/// allocation request.
pub const MAX_BLOCK_SIZE: usize = 32 * 1024 * 1024;

/// Writes a `u32` in host byte order.
pub fn write_u32(stream: &mut dyn Stream, value: u32) -> Result<(), StreamError> {
    stream.write_bytes(&value.to_ne_bytes())
}

/// Reads a `u32` in host byte order.
pub fn read_u32(stream: &mut dyn Stream) -> Result<u32, StreamError> {
    let bytes = stream.read_bytes(4)?;
    let mut raw = [0u8; 4];
    raw.copy_from_slice(bytes);
    Ok(u32::from_ne_bytes(raw))
}

/// Writes `data` as a length-prefixed block.
///
/// # Errors
/// [`StreamError::BlockTooLarge`] if `data` is longer than
/// [`MAX_BLOCK_SIZE`]. Nothing is written in that case.
pub fn write_block(stream: &mut dyn Stream, data: &[u8]) -> Result<(), StreamError> {
    check_block_size(data.len())?;
    // MAX_BLOCK_SIZE fits in a u32, so the cast cannot truncate.
    write_u32(stream, data.len() as u32)?;
    stream.write_bytes(data)
}

/// Reads the length prefix of a block.
///
/// # Errors
/// [`StreamError::BlockTooLarge`] if the prefix exceeds [`MAX_BLOCK_SIZE`].
pub fn read_block_length(stream: &mut dyn Stream) -> Result<usize, StreamError> {
    let len = read_u32(stream)? as usize;
    check_block_size(len)?;
    Ok(len)
}

/// Reads the `len` bytes of block data that follow a length prefix.
pub fn read_block_data(stream: &mut dyn Stream, len: usize) -> Result<&[u8], StreamError> {
    stream.read_bytes(len)
}

fn check_block_size(size: usize) -> Result<(), StreamError> {
    if size > MAX_BLOCK_SIZE {
        return Err(StreamError::BlockTooLarge {
            size,
            max: MAX_BLOCK_SIZE,
        });
    }
    Ok(())
}
