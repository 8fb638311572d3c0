/// Errors that can occur while reading or writing a byte stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// Fewer bytes remain than the read asked for.
    #[error("stream underflow: requested {requested} bytes, {available} available")]
    Underflow { requested: usize, available: usize },

    /// The cursor was moved past the logical end of the stream.
    #[error("invalid seek to {position} in a stream of length {length}")]
    InvalidSeek { position: usize, length: usize },

    /// A length-prefixed block exceeds [`MAX_BLOCK_SIZE`](crate::MAX_BLOCK_SIZE).
    #[error("block of {size} bytes exceeds the maximum of {max} bytes")]
    BlockTooLarge { size: usize, max: usize },

    /// The stream is a read-only view.
    #[error("write attempted on a read-only stream")]
    WriteOnReadOnly,
}
