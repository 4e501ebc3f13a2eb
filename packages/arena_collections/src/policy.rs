use std::num::NonZero;

/// Decides how many elements to actually allocate when a container needs room for `n`.
///
/// A policy only expresses a growth strategy; it never looks at the storage it is sizing.
/// Every policy is monotonic (`a <= b` implies `apply(a) <= apply(b)`), never returns less
/// than it was asked for (saturating at `usize::MAX`) and is idempotent, so applying a policy to
/// its own output returns the same count again.
///
/// # Examples
///
/// ```
/// use std::num::NonZero;
///
/// use arena_collections::AllocationPolicy;
///
/// assert_eq!(AllocationPolicy::Exact.apply(5), 5);
/// assert_eq!(AllocationPolicy::Doubling.apply(5), 8);
/// assert_eq!(AllocationPolicy::Chunked(NonZero::new(4).unwrap()).apply(5), 8);
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum AllocationPolicy {
    /// Allocates exactly the requested count. Natural fit for fixed-capacity storage.
    Exact,

    /// Rounds up to the next power of two, giving amortized O(1) growth.
    ///
    /// Counts above the largest power of two in `usize` saturate to `usize::MAX`.
    #[default]
    Doubling,

    /// Rounds up to a whole number of chunks of the given size.
    ///
    /// If the next multiple does not fit in `usize`, the result saturates to `usize::MAX`,
    /// which is then not a multiple of the chunk. No storage can provide that many elements, so
    /// the allocation fails either way.
    Chunked(NonZero<usize>),
}

impl AllocationPolicy {
    /// Maps a requested element count to the count that should be allocated.
    #[must_use]
    pub fn apply(self, requested: usize) -> usize {
        match self {
            Self::Exact => requested,
            Self::Doubling if requested == 0 => 0,
            Self::Doubling => requested.checked_next_power_of_two().unwrap_or(usize::MAX),
            Self::Chunked(chunk) => requested
                .div_ceil(chunk.get())
                .checked_mul(chunk.get())
                .unwrap_or(usize::MAX),
        }
    }
}
