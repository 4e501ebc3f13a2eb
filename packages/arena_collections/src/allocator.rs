use std::fmt::Debug;
use std::ptr::NonNull;

use crate::AllocationPolicy;

/// A provider of one contiguous, typed, uninitialized buffer at a time.
///
/// Containers ask an allocator for a block of at least `n` element slots, access it through
/// [`block_ptr()`][Self::block_ptr] and give it back with [`deallocate()`][Self::deallocate].
/// Allocation is all-or-nothing: a request is either satisfied in full or refused with `None`.
///
/// The allocator itself never initializes or drops elements - that is the container's job.
///
/// # Relocatability
///
/// [`RELOCATABLE`][Self::RELOCATABLE] states whether a container's storage can change owner by
/// copying the allocator and its block handles (true for heap-backed storage) or whether the
/// buffer lives inside the allocator value itself, in which case a container moving to a new
/// owner has to move its elements one by one into storage of the new owner.
///
/// # Safety
///
/// For every block returned by `allocate(n)` and not yet deallocated, `block_ptr()` must return
/// a pointer that is valid for reads and writes of `n` consecutive `T` values and that is aligned
/// for `T`. Any elements a container wrote into a block must still be there when the container
/// asks for the pointer again, including after the allocator has handed out another block.
pub unsafe trait Allocator<T> {
    /// Whether the storage can be adopted by a new owner by handle, in O(1).
    const RELOCATABLE: bool;

    /// The growth policy containers should use with this allocator unless told otherwise.
    const DEFAULT_POLICY: AllocationPolicy;

    /// The bookkeeping a caller keeps for one outstanding allocation.
    type Block: Debug;

    /// Allocates a block with room for at least `n` elements.
    ///
    /// Returns `None` if the request cannot be satisfied in full, including when `n` is zero or
    /// exceeds [`max_size()`][Self::max_size].
    fn allocate(&mut self, n: usize) -> Option<Self::Block>;

    /// Releases a block previously returned by [`allocate()`][Self::allocate] with the same `n`.
    ///
    /// Returns `false` and leaves the allocator unchanged if the block was not issued by this
    /// allocator or `n` does not match the allocation.
    fn deallocate(&mut self, block: Self::Block, n: usize) -> bool;

    /// The upper bound on the element count of any single allocation.
    fn max_size(&self) -> usize;

    /// Resolves a block to the address of its first element at the allocator's current location.
    fn block_ptr(&self, block: &Self::Block) -> NonNull<T>;
}
