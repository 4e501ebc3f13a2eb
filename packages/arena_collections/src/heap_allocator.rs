use std::alloc::{Layout, alloc, dealloc};
use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use tracing::trace;

use crate::{AllocationPolicy, Allocator};

/// An allocator that obtains every block from the global heap allocator.
///
/// Any number of blocks may be outstanding at the same time, each tracked by its caller. The
/// allocator itself is stateless, so containers using it can change owner by handle copy.
///
/// # Examples
///
/// ```
/// use arena_collections::{Allocator, HeapAllocator};
///
/// let mut allocator = HeapAllocator::<u64>::new();
///
/// let a = allocator.allocate(16).unwrap();
/// let b = allocator.allocate(32).unwrap();
///
/// assert!(allocator.deallocate(a, 16));
/// assert!(allocator.deallocate(b, 32));
/// ```
pub struct HeapAllocator<T> {
    _item: PhantomData<fn() -> T>,
}

/// A block of a [`HeapAllocator`].
pub struct HeapBlock<T> {
    ptr: NonNull<T>,
    len: usize,
}

impl<T> fmt::Debug for HeapBlock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeapBlock")
            .field("item_type", &format_args!("{}", type_name::<T>()))
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .finish()
    }
}

// SAFETY: A block is a unique pointer to a heap buffer of `T` slots, no different from a
// `Box<[MaybeUninit<T>]>` in terms of thread mobility.
unsafe impl<T: Send> Send for HeapBlock<T> {}

// SAFETY: See above - shared access to the block only ever yields the pointer value.
unsafe impl<T: Sync> Sync for HeapBlock<T> {}

impl<T> HeapAllocator<T> {
    /// Creates a heap allocator.
    #[must_use]
    pub fn new() -> Self {
        Self { _item: PhantomData }
    }
}

impl<T> Default for HeapAllocator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for HeapAllocator<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for HeapAllocator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeapAllocator")
            .field("item_type", &format_args!("{}", type_name::<T>()))
            .finish()
    }
}

// SAFETY: Every block owns a heap buffer sized and aligned for `n` elements by `Layout::array`
// (or is a dangling but well-aligned pointer for zero-sized layouts), which stays put until the
// block is deallocated, regardless of where the allocator value is.
unsafe impl<T> Allocator<T> for HeapAllocator<T> {
    const RELOCATABLE: bool = true;
    const DEFAULT_POLICY: AllocationPolicy = AllocationPolicy::Doubling;

    type Block = HeapBlock<T>;

    fn allocate(&mut self, n: usize) -> Option<HeapBlock<T>> {
        if n == 0 {
            return None;
        }

        let Ok(layout) = Layout::array::<T>(n) else {
            trace!(
                requested = n,
                item_type = type_name::<T>(),
                "heap allocation request exceeds the maximum layout size"
            );
            return None;
        };

        if layout.size() == 0 {
            return Some(HeapBlock {
                ptr: NonNull::dangling(),
                len: n,
            });
        }

        // SAFETY: The layout is valid and not zero-sized (checked above).
        let ptr = NonNull::new(unsafe { alloc(layout) }.cast::<T>());

        let Some(ptr) = ptr else {
            trace!(
                requested = n,
                item_type = type_name::<T>(),
                "global allocator refused heap allocation"
            );
            return None;
        };

        Some(HeapBlock { ptr, len: n })
    }

    fn deallocate(&mut self, block: HeapBlock<T>, n: usize) -> bool {
        if block.len != n {
            // We cannot tell which of the two lengths is the lie, so we keep our hands off the
            // memory. Leaking is the only outcome that cannot corrupt the heap.
            return false;
        }

        let layout = Layout::array::<T>(n).expect("layout was valid when the block was allocated");

        if layout.size() != 0 {
            // SAFETY: The block came from `alloc()` with this exact layout.
            unsafe {
                dealloc(block.ptr.as_ptr().cast(), layout);
            }
        }

        true
    }

    fn max_size(&self) -> usize {
        let item_size = size_of::<T>().max(1);

        // Layouts may not exceed isize::MAX bytes.
        (isize::MAX.unsigned_abs()) / item_size
    }

    fn block_ptr(&self, block: &HeapBlock<T>) -> NonNull<T> {
        block.ptr
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(HeapAllocator<u32>: Send, Sync);
    assert_impl_all!(HeapBlock<u32>: Send, Sync);

    // Blocks are Debug regardless of the item type.
    struct Opaque;
    assert_impl_all!(HeapBlock<Opaque>: fmt::Debug);

    #[test]
    fn block_debug_names_item_type() {
        let mut allocator = HeapAllocator::<Opaque>::new();

        let block = allocator.allocate(3).unwrap();
        let text = format!("{block:?}");

        assert!(text.contains("Opaque"));
        assert!(text.contains("len: 3"));

        assert!(allocator.deallocate(block, 3));
    }

    #[test]
    fn zero_is_refused() {
        let mut allocator = HeapAllocator::<u32>::new();

        assert!(allocator.allocate(0).is_none());
    }

    #[test]
    fn oversized_is_refused() {
        let mut allocator = HeapAllocator::<u64>::new();

        assert!(allocator.allocate(usize::MAX).is_none());
        assert!(allocator.max_size() < usize::MAX);
    }

    #[test]
    fn independent_blocks() {
        let mut allocator = HeapAllocator::<u32>::new();

        let a = allocator.allocate(4).unwrap();
        let b = allocator.allocate(4).unwrap();

        assert_ne!(allocator.block_ptr(&a), allocator.block_ptr(&b));

        // SAFETY: Both blocks have room for four elements.
        unsafe {
            allocator.block_ptr(&a).write(1);
            allocator.block_ptr(&b).write(2);

            assert_eq!(allocator.block_ptr(&a).read(), 1);
            assert_eq!(allocator.block_ptr(&b).read(), 2);
        }

        assert!(allocator.deallocate(a, 4));
        assert!(allocator.deallocate(b, 4));
    }

    #[test]
    fn mismatched_length_is_reported() {
        let mut allocator = HeapAllocator::<u32>::new();

        let block = allocator.allocate(4).unwrap();
        assert!(!allocator.deallocate(block, 8));
    }

    #[test]
    fn zero_sized_items() {
        let mut allocator = HeapAllocator::<()>::new();

        let block = allocator.allocate(100).unwrap();
        assert!(allocator.deallocate(block, 100));
    }
}
