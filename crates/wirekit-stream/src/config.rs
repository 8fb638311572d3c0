//! Sizing policy for [`GrowableStream`](crate::GrowableStream).

use serde::{Deserialize, Serialize};

/// Controls how a [`GrowableStream`](crate::GrowableStream) grows and
/// shrinks its backing buffer.
///
/// Growth is linear-then-proportional: each reallocation adds
/// `linear_growth` bytes, then half of the result again, and rounds down to
/// `alignment`. Small streams grow in steady steps; large ones grow by about
/// 1.5x, which bounds both the number of reallocations and the waste.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Bytes added on every growth step before the proportional part.
    pub linear_growth: usize,

    /// Physical sizes are multiples of this. Must be a power of two;
    /// other values are rounded up to one.
    pub alignment: usize,

    /// A truncated stream only gives memory back when its buffer is larger
    /// than this many bytes (and more than twice the logical length).
    pub shrink_floor: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            linear_growth: 64,
            alignment: 32,
            shrink_floor: 2048,
        }
    }
}

impl StreamConfig {
    /// The alignment actually used: a power of two, at least 1.
    pub fn effective_alignment(&self) -> usize {
        self.alignment.max(1).next_power_of_two()
    }

    /// Rounds `size` up to the alignment.
    pub(crate) fn round_up(&self, size: usize) -> usize {
        let mask = self.effective_alignment() - 1;
        size.saturating_add(mask) & !mask
    }

    /// The next physical size after `current` under the growth policy.
    pub(crate) fn grow(&self, current: usize) -> usize {
        let mask = self.effective_alignment() - 1;
        let next = current.saturating_add(self.linear_growth.max(1));
        let next = next.saturating_add(next >> 1);
        // Rounding down can never undo the linear step entirely.
        (next & !mask).max(current + 1)
    }
}
