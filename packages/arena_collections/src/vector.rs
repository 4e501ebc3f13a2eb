use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut, Range};
use std::{mem, ptr, slice};

use tracing::trace;

use crate::{AllocationPolicy, Allocator, HeapAllocator};

/// A growable contiguous array whose buffer comes from an [`Allocator`].
///
/// This is the storage the hash tables keep their bucket records in. It offers the subset of the
/// `Vec` surface that containers in this crate need, with one important difference: growth is
/// fallible. Every operation that may need more room reports failure instead of panicking, and a
/// failed growth leaves the existing elements exactly as they were.
///
/// Growth goes through an [`AllocationPolicy`], which defaults to the policy suggested by the
/// allocator (doubling on the heap, exact-fit in fixed storage).
///
/// # Examples
///
/// ```
/// use arena_collections::{FixedAllocator, Vector};
///
/// let mut vector = Vector::<u32, FixedAllocator<u32, 2>>::new();
///
/// assert!(vector.push(1));
/// assert!(vector.push(2));
/// assert!(!vector.push(3));
///
/// assert_eq!(vector.as_slice(), &[1, 2]);
/// ```
pub struct Vector<T, A: Allocator<T> = HeapAllocator<T>> {
    allocator: A,
    block: Option<A::Block>,

    // Elements `0..len` of the block are initialized.
    len: usize,

    // The element count the current block was allocated with. Zero if there is no block.
    capacity: usize,

    policy: AllocationPolicy,

    _items: PhantomData<T>,
}

impl<T, A: Allocator<T> + Default> Vector<T, A> {
    /// Creates an empty vector using the allocator's default growth policy.
    ///
    /// No memory is allocated until the first element is added.
    #[must_use]
    pub fn new() -> Self {
        Self::with_allocator(A::default())
    }

    /// Creates an empty vector with a specific growth policy.
    #[must_use]
    pub fn with_policy(policy: AllocationPolicy) -> Self {
        let mut vector = Self::new();
        vector.policy = policy;
        vector
    }

    /// Moves the contents out into a new vector, leaving this one empty but usable.
    ///
    /// With a relocatable allocator, the buffer itself changes owner and no element moves.
    /// Otherwise, every element is moved into the new vector's own storage.
    #[must_use]
    pub fn take(&mut self) -> Self {
        let policy = self.policy;

        if A::RELOCATABLE {
            return mem::replace(self, Self::with_policy(policy));
        }

        let mut moved = Self::with_policy(policy);

        assert!(
            moved.reserve(self.len),
            "storage of the same type must be able to hold the same number of {}",
            type_name::<T>()
        );

        let count = self.len;

        // Ownership of the elements transfers by bitwise copy, so the source must forget them.
        self.len = 0;

        if count > 0 {
            let source = self.data_ptr();
            let destination = moved.data_ptr();

            // SAFETY: Both blocks have room for `count` elements, the first `count` of the source
            // are initialized and the two vectors have different allocators, so different buffers.
            unsafe {
                ptr::copy_nonoverlapping(source, destination, count);
            }
        }

        moved.len = count;
        moved
    }
}

impl<T, A: Allocator<T>> Vector<T, A> {
    /// Creates an empty vector that takes its memory from the given allocator.
    #[must_use]
    pub fn with_allocator(allocator: A) -> Self {
        Self {
            allocator,
            block: None,
            len: 0,
            capacity: 0,
            policy: A::DEFAULT_POLICY,
            _items: PhantomData,
        }
    }

    /// The number of elements in the vector.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the vector holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The number of elements the vector can hold without allocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The growth policy used when elements are added one at a time.
    #[must_use]
    pub fn policy(&self) -> AllocationPolicy {
        self.policy
    }

    /// The largest number of elements the allocator could ever provide room for.
    #[must_use]
    pub fn max_size(&self) -> usize {
        self.allocator.max_size()
    }

    fn data_ptr(&self) -> *mut T {
        self.block
            .as_ref()
            .map_or(ptr::NonNull::dangling(), |block| {
                self.allocator.block_ptr(block)
            })
            .as_ptr()
    }

    /// Ensures room for at least `capacity` elements in total.
    ///
    /// Returns `false` if the allocator cannot provide that much, in which case the vector is
    /// left unchanged.
    #[must_use]
    pub fn reserve(&mut self, capacity: usize) -> bool {
        if capacity <= self.capacity {
            return true;
        }

        let Some(new_block) = self.allocator.allocate(capacity) else {
            trace!(
                len = self.len,
                capacity = self.capacity,
                requested = capacity,
                item_type = type_name::<T>(),
                "vector could not grow"
            );
            return false;
        };

        if let Some(old_block) = self.block.take() {
            let source = self.allocator.block_ptr(&old_block).as_ptr();
            let destination = self.allocator.block_ptr(&new_block).as_ptr();

            // Allocators that keep their buffer inline hand out the same buffer again,
            // in which case the elements are already where they need to be.
            if source != destination {
                // SAFETY: Both blocks are live and distinct allocations, the old one holds `len`
                // initialized elements and the new one has room for more than that.
                unsafe {
                    ptr::copy_nonoverlapping(source, destination, self.len);
                }
            }

            let released = self.allocator.deallocate(old_block, self.capacity);
            debug_assert!(released, "allocator refused a block it issued");
        }

        self.block = Some(new_block);
        self.capacity = capacity;
        true
    }

    fn grow_for_one_more(&mut self) -> bool {
        if self.len < self.capacity {
            return true;
        }

        let required = self
            .len
            .checked_add(1)
            .expect("a vector cannot hold more elements than virtual memory can fit");

        // The policy may ask for more than the allocator can give, in which case we still
        // try to make room for the one element we actually need.
        self.reserve(self.policy.apply(required)) || self.reserve(required)
    }

    /// Appends an element. Returns `false` (dropping the value) if there is no room for it.
    pub fn push(&mut self, value: T) -> bool {
        if !self.grow_for_one_more() {
            return false;
        }

        // SAFETY: We just ensured `len < capacity`, so the slot is inside the block.
        unsafe {
            self.data_ptr().add(self.len).write(value);
        }

        self.len = self
            .len
            .checked_add(1)
            .expect("guarded by len < capacity above");
        true
    }

    /// Inserts an element at `index`, shifting everything after it to the right.
    ///
    /// Returns `false` (dropping the value) if there is no room for it.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, value: T) -> bool {
        assert!(
            index <= self.len,
            "insertion index {index} is out of bounds in vector of {} with length {}",
            type_name::<T>(),
            self.len
        );

        if !self.grow_for_one_more() {
            return false;
        }

        let tail = self.len.wrapping_sub(index);

        // SAFETY: `index <= len < capacity`, so the source range `index..len` and the destination
        // range `index+1..=len` both lie within the block. `ptr::copy` permits the overlap.
        unsafe {
            let at = self.data_ptr().add(index);
            ptr::copy(at, at.add(1), tail);
            at.write(value);
        }

        self.len = self
            .len
            .checked_add(1)
            .expect("guarded by len < capacity above");
        true
    }

    /// Removes and returns the element at `index`, shifting everything after it to the left.
    ///
    /// Returns `None` if `index` is out of bounds.
    pub fn erase(&mut self, index: usize) -> Option<T> {
        if index >= self.len {
            return None;
        }

        let tail = self.len.wrapping_sub(index).wrapping_sub(1);

        // SAFETY: `index < len`, so the element is initialized and the tail range lies within
        // the initialized part of the block. The read element is not touched again.
        let value = unsafe {
            let at = self.data_ptr().add(index);
            let value = at.read();
            ptr::copy(at.add(1), at, tail);
            value
        };

        self.len = self.len.wrapping_sub(1);
        Some(value)
    }

    /// Removes (and drops) the elements in `range`, shifting the rest to the left.
    ///
    /// Returns `false` and changes nothing if the range is out of bounds or inverted.
    pub fn erase_range(&mut self, range: Range<usize>) -> bool {
        if range.start > range.end || range.end > self.len {
            return false;
        }

        let removed = range.end.wrapping_sub(range.start);
        let tail = self.len.wrapping_sub(range.end);

        // Forget the range and the tail before dropping, so a panicking destructor cannot
        // lead to a double drop. At worst the tail leaks.
        self.len = range.start;

        // SAFETY: The range was validated against `len`, so every element in it is initialized.
        // After dropping, we move the initialized tail down over the freed slots.
        unsafe {
            let at = self.data_ptr().add(range.start);
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(at, removed));
            ptr::copy(at.add(removed), at, tail);
        }

        self.len = range.start.wrapping_add(tail);
        true
    }

    /// Resizes the vector to `len` elements, filling new slots with clones of `value`.
    ///
    /// Returns `false` and changes nothing if the storage cannot hold `len` elements.
    #[must_use]
    pub fn resize(&mut self, len: usize, value: T) -> bool
    where
        T: Clone,
    {
        if len <= self.len {
            self.truncate(len);
            return true;
        }

        if !self.reserve(len) {
            return false;
        }

        while self.len < len {
            // SAFETY: `len <= capacity` after the reserve above and we stay below `len`.
            unsafe {
                self.data_ptr().add(self.len).write(value.clone());
            }

            self.len = self.len.wrapping_add(1);
        }

        true
    }

    /// Drops every element past `len`.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }

        _ = self.erase_range(len..self.len);
    }

    /// Drops every element, keeping the allocated block.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// A reference to the element at `index`, if there is one.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    /// An exclusive reference to the element at `index`, if there is one.
    #[must_use]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.as_mut_slice().get_mut(index)
    }

    /// The initialized elements as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: The first `len` elements are initialized and the pointer is either into a live
        // block or dangling with `len == 0`, both of which are valid for a slice.
        unsafe { slice::from_raw_parts(self.data_ptr(), self.len) }
    }

    /// The initialized elements as an exclusive slice.
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: As in `as_slice()`, plus we hold an exclusive reference to the vector.
        unsafe { slice::from_raw_parts_mut(self.data_ptr(), self.len) }
    }

    /// Iterates over the elements in order.
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }
}

impl<T, A: Allocator<T>> Drop for Vector<T, A> {
    fn drop(&mut self) {
        self.clear();

        if let Some(block) = self.block.take() {
            let released = self.allocator.deallocate(block, self.capacity);
            debug_assert!(released, "allocator refused a block it issued");
        }
    }
}

impl<T, A: Allocator<T> + Default> Default for Vector<T, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, A: Allocator<T> + Default> Clone for Vector<T, A> {
    fn clone(&self) -> Self {
        let mut clone = Self::with_policy(self.policy);

        assert!(
            clone.reserve(self.len),
            "storage of the same type must be able to hold the same number of {}",
            type_name::<T>()
        );

        for item in self {
            let pushed = clone.push(item.clone());
            debug_assert!(pushed, "guarded by reserve above");
        }

        clone
    }
}

impl<T: fmt::Debug, A: Allocator<T>> fmt::Debug for Vector<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, A: Allocator<T>> Index<usize> for Vector<T, A> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        self.get(index).unwrap_or_else(|| {
            panic!(
                "index {index} is out of bounds in vector of {} with length {}",
                type_name::<T>(),
                self.len
            )
        })
    }
}

impl<T, A: Allocator<T>> IndexMut<usize> for Vector<T, A> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len;

        self.get_mut(index).unwrap_or_else(|| {
            panic!(
                "index {index} is out of bounds in vector of {} with length {len}",
                type_name::<T>()
            )
        })
    }
}

impl<'a, T, A: Allocator<T>> IntoIterator for &'a Vector<T, A> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
