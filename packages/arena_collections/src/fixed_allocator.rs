use std::any::type_name;
use std::cell::UnsafeCell;
use std::fmt;
use std::mem::MaybeUninit;
use std::ptr::NonNull;

use tracing::trace;

use crate::{AllocationPolicy, Allocator, OwnerId};

/// An allocator whose entire capacity of `N` elements is stored inline, inside the allocator.
///
/// No dynamic memory is ever used. The allocator serves the usage pattern of a single growing
/// container: there is one buffer and every successful allocation hands out that same buffer.
/// When a container grows from one block to the next, its elements are already where the new
/// block expects them.
///
/// At most one block is live at a time, apart from the replacement block a container allocates
/// while it grows out of its current one. Debug builds panic if a third block is requested.
///
/// Because the buffer moves whenever the allocator moves, this allocator is not relocatable.
///
/// # Examples
///
/// ```
/// use arena_collections::{Allocator, FixedAllocator};
///
/// let mut allocator = FixedAllocator::<u64, 4>::new();
///
/// assert!(allocator.allocate(5).is_none());
///
/// let block = allocator.allocate(4).unwrap();
/// assert!(allocator.deallocate(block, 4));
/// ```
pub struct FixedAllocator<T, const N: usize> {
    owner: OwnerId,
    data: UnsafeCell<[MaybeUninit<T>; N]>,

    // Number of blocks handed out and not yet deallocated.
    #[cfg(debug_assertions)]
    live_blocks: usize,
}

// A growing container holds its current block and the one it is growing into.
#[cfg(debug_assertions)]
const MAX_LIVE_BLOCKS: usize = 2;

/// A block of a [`FixedAllocator`].
#[derive(Debug, Eq, PartialEq)]
pub struct FixedBlock {
    owner: OwnerId,
    len: usize,
}

impl<T, const N: usize> FixedAllocator<T, N> {
    /// Creates an allocator with all `N` slots available.
    #[must_use]
    pub fn new() -> Self {
        Self {
            owner: OwnerId::next(),
            data: UnsafeCell::new([const { MaybeUninit::uninit() }; N]),
            #[cfg(debug_assertions)]
            live_blocks: 0,
        }
    }

    /// The identity that blocks of this allocator are tagged with.
    #[must_use]
    pub fn owner(&self) -> OwnerId {
        self.owner
    }
}

// SAFETY: The allocator itself never reads or writes the buffer. Containers write to it only
// through exclusive access to themselves (and thereby to the allocator) and only read from it
// through shared access, the same rules that make `[T; N]` Sync when `T` is.
unsafe impl<T: Sync, const N: usize> Sync for FixedAllocator<T, N> {}

impl<T, const N: usize> Default for FixedAllocator<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> fmt::Debug for FixedAllocator<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedAllocator")
            .field("item_type", &format_args!("{}", type_name::<T>()))
            .field("owner", &self.owner)
            .field("capacity", &N)
            .finish_non_exhaustive()
    }
}

// SAFETY: The buffer is inline, so `block_ptr()` is valid for `N` elements wherever the allocator
// currently lives. We never touch the contents, so whatever a container wrote there stays intact
// across allocations (all blocks are the same buffer).
unsafe impl<T, const N: usize> Allocator<T> for FixedAllocator<T, N> {
    const RELOCATABLE: bool = false;
    const DEFAULT_POLICY: AllocationPolicy = AllocationPolicy::Exact;

    type Block = FixedBlock;

    fn allocate(&mut self, n: usize) -> Option<FixedBlock> {
        if n == 0 || n > N {
            trace!(
                requested = n,
                capacity = N,
                item_type = type_name::<T>(),
                "fixed allocator cannot satisfy request"
            );
            return None;
        }

        #[cfg(debug_assertions)]
        {
            assert!(
                self.live_blocks < MAX_LIVE_BLOCKS,
                "{} serves one container at a time but was asked for a block while {} are live",
                type_name::<Self>(),
                self.live_blocks
            );

            self.live_blocks = self
                .live_blocks
                .checked_add(1)
                .expect("guarded by the assertion above");
        }

        Some(FixedBlock {
            owner: self.owner,
            len: n,
        })
    }

    fn deallocate(&mut self, block: FixedBlock, n: usize) -> bool {
        if block.owner != self.owner || block.len != n {
            return false;
        }

        #[cfg(debug_assertions)]
        {
            self.live_blocks = self
                .live_blocks
                .checked_sub(1)
                .expect("a block of this allocator was released more often than it was issued");
        }

        true
    }

    fn max_size(&self) -> usize {
        N
    }

    fn block_ptr(&self, block: &FixedBlock) -> NonNull<T> {
        debug_assert_eq!(
            block.owner, self.owner,
            "block of a different allocator used with {}",
            type_name::<Self>()
        );

        NonNull::new(self.data.get().cast::<T>()).expect("pointers to fields are never null")
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::Cell;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(FixedAllocator<u32, 4>: Send, Sync);
    assert_not_impl_any!(FixedAllocator<Cell<u32>, 4>: Sync);

    #[test]
    fn rejects_zero_and_oversized_requests() {
        let mut allocator = FixedAllocator::<u32, 3>::new();

        assert!(allocator.allocate(0).is_none());
        assert!(allocator.allocate(4).is_none());
        assert_eq!(allocator.max_size(), 3);
    }

    #[test]
    fn every_block_is_the_same_buffer() {
        let mut allocator = FixedAllocator::<u32, 3>::new();

        let small = allocator.allocate(1).unwrap();
        let large = allocator.allocate(3).unwrap();

        assert_eq!(allocator.block_ptr(&small), allocator.block_ptr(&large));

        assert!(allocator.deallocate(small, 1));
        assert!(allocator.deallocate(large, 3));
    }

    #[test]
    fn deallocate_rejects_mismatched_length() {
        let mut allocator = FixedAllocator::<u32, 3>::new();

        let block = allocator.allocate(2).unwrap();
        assert!(!allocator.deallocate(block, 3));
    }

    #[test]
    fn deallocate_rejects_foreign_block() {
        let mut a = FixedAllocator::<u32, 3>::new();
        let mut b = FixedAllocator::<u32, 3>::new();

        let block = a.allocate(2).unwrap();
        assert!(!b.deallocate(block, 2));
    }

    #[test]
    fn released_blocks_can_be_requested_again() {
        let mut allocator = FixedAllocator::<u32, 3>::new();

        for n in 1..=3 {
            let block = allocator.allocate(n).unwrap();
            assert!(allocator.deallocate(block, n));
        }
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic]
    fn third_live_block_panics() {
        let mut allocator = FixedAllocator::<u32, 3>::new();

        let _current = allocator.allocate(1).unwrap();
        let _replacement = allocator.allocate(2).unwrap();
        _ = allocator.allocate(3);
    }

    #[test]
    fn contents_survive_reallocation() {
        let mut allocator = FixedAllocator::<u32, 4>::new();

        let first = allocator.allocate(2).unwrap();
        let ptr = allocator.block_ptr(&first);

        // SAFETY: The block has room for two elements.
        unsafe {
            ptr.write(10);
        }

        let second = allocator.allocate(4).unwrap();
        assert!(allocator.deallocate(first, 2));

        // SAFETY: We initialized the first element above and the buffer is shared by all blocks.
        let value = unsafe { allocator.block_ptr(&second).read() };
        assert_eq!(value, 10);
    }
}
