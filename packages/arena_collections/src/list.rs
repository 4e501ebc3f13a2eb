use std::any::type_name;
use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::mem;

use crate::{Arena, Error, FixedArena, Handle, HeapArena, Result};

/// One link of a [`List`], owned by the list's arena.
///
/// Neighboring nodes refer to each other only through weak handles; no node owns another. The
/// two sentinel nodes at either end of every list carry no value.
#[derive(Debug)]
pub struct ListNode<T> {
    prev: Handle,
    next: Handle,
    value: Option<T>,
}

/// A position in a [`List`]: either an element or the end of the list.
///
/// Cursors are plain copyable values that do not borrow the list. A cursor stays valid until the
/// element it points to is erased or the list that issued it is dropped or moved from. Using a
/// cursor that is no longer valid is not undefined behavior - the list recognizes that the cursor
/// does not denote one of its elements and treats it accordingly (e.g. `get()` returns `None`).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Cursor(Handle);

impl Cursor {
    /// The arena handle of the node this cursor points to.
    #[must_use]
    pub fn handle(self) -> Handle {
        self.0
    }
}

/// A doubly linked list whose nodes are created and destroyed through an [`Arena`].
///
/// The list is delimited by two permanent sentinel nodes, so inserting and erasing never needs
/// to special-case the first or last element. Positions are expressed as [`Cursor`]s.
///
/// The choice of arena decides where the nodes live:
///
/// * [`HeapList`] - every node is an individual heap allocation; unbounded.
/// * [`FixedList`] - all nodes live inline in the list, with room for a fixed number of nodes
///   (two of which are taken by the sentinels). No dynamic memory is used.
///
/// Insertion into a full list fails without modifying the list.
///
/// # Moving a list
///
/// [`take()`][Self::take] moves the contents of a list into a new list and leaves the source
/// empty. With a relocatable arena the new list simply adopts the arena, in O(1), and every cursor
/// into the source now points into the new list. With a fixed arena, values are moved one by one
/// into nodes of the new list, in O(n), and cursors into the source do not carry over.
///
/// # Examples
///
/// ```
/// use arena_collections::HeapList;
///
/// let mut list = HeapList::new();
///
/// let b = list.push_back('b');
/// list.push_front('a');
/// list.push_back('d');
///
/// let d = list.next(b);
/// list.emplace(d, 'c');
///
/// assert_eq!(list.iter().collect::<String>(), "abcd");
///
/// let after = list.erase(b);
/// assert_eq!(list.get(after), Some(&'c'));
/// ```
pub struct List<T, A: Arena<ListNode<T>> = HeapArena<ListNode<T>>> {
    arena: A,
    head: Handle,
    end: Handle,
    len: usize,

    _items: PhantomData<T>,
}

/// A [`List`] whose nodes are individual heap allocations.
pub type HeapList<T> = List<T, HeapArena<ListNode<T>>>;

/// A [`List`] whose nodes live inline, in `SLOTS` fixed slots.
///
/// Two of the slots are taken by the sentinels, so the list holds up to `SLOTS - 2` elements.
pub type FixedList<T, const SLOTS: usize> = List<T, FixedArena<ListNode<T>, SLOTS>>;

impl<T, A: Arena<ListNode<T>> + Default> List<T, A> {
    /// Creates an empty list.
    ///
    /// # Panics
    ///
    /// Panics if the arena does not have room for the two sentinel nodes.
    #[must_use]
    pub fn new() -> Self {
        let mut arena = A::default();

        // The sentinels link to themselves at the outer ends, so the placeholder is overwritten
        // before construction completes.
        let placeholder = Handle::new(arena.owner(), usize::MAX);

        let end = arena
            .create(ListNode {
                prev: placeholder,
                next: placeholder,
                value: None,
            })
            .expect("list storage must have room for the two sentinel nodes");

        let head = arena
            .create(ListNode {
                prev: placeholder,
                next: end,
                value: None,
            })
            .expect("list storage must have room for the two sentinel nodes");

        let end_node = arena
            .get_mut(end)
            .expect("we just created the end sentinel");
        end_node.prev = head;
        end_node.next = end;

        arena
            .get_mut(head)
            .expect("we just created the head sentinel")
            .prev = head;

        Self {
            arena,
            head,
            end,
            len: 0,
            _items: PhantomData,
        }
    }

    /// Moves every element into a new list, leaving this list empty.
    ///
    /// With a relocatable arena, the new list adopts the nodes as they are, in O(1), and cursors
    /// into this list become cursors into the new list. Otherwise, each value is moved into a
    /// new node of the new list, in O(n).
    #[must_use]
    pub fn take(&mut self) -> Self {
        if A::RELOCATABLE {
            return mem::replace(self, Self::new());
        }

        let mut moved = Self::new();
        moved.refill_from(self);
        moved
    }

    /// Replaces the contents of this list with the contents of `source`, leaving `source` empty.
    ///
    /// This follows the same strategy as [`take()`][Self::take].
    pub fn take_from(&mut self, source: &mut Self) {
        if A::RELOCATABLE {
            *self = source.take();
            return;
        }

        self.clear();
        self.refill_from(source);
    }

    fn refill_from(&mut self, source: &mut Self) {
        while let Some(value) = source.pop_front() {
            let end = self.end();

            assert!(
                self.try_emplace(end, value).is_ok(),
                "storage of the same type must be able to hold the same number of {}",
                type_name::<T>()
            );
        }
    }
}

impl<T, A: Arena<ListNode<T>>> List<T, A> {
    fn node(&self, handle: Handle) -> &ListNode<T> {
        self.arena
            .get(handle)
            .expect("list links only ever point at live nodes")
    }

    fn node_mut(&mut self, handle: Handle) -> &mut ListNode<T> {
        self.arena
            .get_mut(handle)
            .expect("list links only ever point at live nodes")
    }

    // Whether the cursor denotes a live element (not a sentinel) of this list.
    fn is_element(&self, cursor: Cursor) -> bool {
        cursor.0 != self.head && cursor.0 != self.end && self.arena.contains(cursor.0)
    }

    /// The number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the list has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The arena that owns the nodes of this list.
    #[must_use]
    pub fn arena(&self) -> &A {
        &self.arena
    }

    /// A cursor to the first element, or [`end()`][Self::end] if the list is empty.
    #[must_use]
    pub fn begin(&self) -> Cursor {
        Cursor(self.node(self.head).next)
    }

    /// The cursor one past the last element.
    #[must_use]
    pub fn end(&self) -> Cursor {
        Cursor(self.end)
    }

    /// The cursor after `cursor`.
    ///
    /// Returns [`end()`][Self::end] at the end of the list or if `cursor` is not an element of
    /// this list.
    #[must_use]
    pub fn next(&self, cursor: Cursor) -> Cursor {
        if !self.is_element(cursor) {
            return self.end();
        }

        Cursor(self.node(cursor.0).next)
    }

    /// The cursor before `cursor`. The element before [`end()`][Self::end] is the last element.
    ///
    /// Returns [`end()`][Self::end] when stepping back from the first element or if `cursor`
    /// does not denote a position in this list.
    #[must_use]
    pub fn prev(&self, cursor: Cursor) -> Cursor {
        if cursor.0 != self.end && !self.is_element(cursor) {
            return self.end();
        }

        let prev = self.node(cursor.0).prev;

        if prev == self.head {
            self.end()
        } else {
            Cursor(prev)
        }
    }

    /// The element at `cursor`, if it denotes an element of this list.
    #[must_use]
    pub fn get(&self, cursor: Cursor) -> Option<&T> {
        self.arena.get(cursor.0)?.value.as_ref()
    }

    /// The element at `cursor` for modification, if it denotes an element of this list.
    #[must_use]
    pub fn get_mut(&mut self, cursor: Cursor) -> Option<&mut T> {
        self.arena.get_mut(cursor.0)?.value.as_mut()
    }

    /// The first element, if any.
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.get(self.begin())
    }

    /// The last element, if any.
    #[must_use]
    pub fn back(&self) -> Option<&T> {
        self.get(self.prev(self.end()))
    }

    /// Inserts `value` in front of `at` and returns a cursor to it.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidOwnership`] if `at` is neither an element nor the end of this list.
    /// * [`Error::CapacityExhausted`] if the arena has no room for another node.
    ///
    /// The list is unchanged on error.
    pub fn try_emplace(&mut self, at: Cursor, value: T) -> Result<Cursor> {
        if at.0 == self.head {
            return Err(Error::InvalidOwnership);
        }

        let prev = self.arena.get(at.0).ok_or(Error::InvalidOwnership)?.prev;

        let inserted = self
            .arena
            .create(ListNode {
                prev,
                next: at.0,
                value: Some(value),
            })
            .ok_or(Error::CapacityExhausted)?;

        self.node_mut(prev).next = inserted;
        self.node_mut(at.0).prev = inserted;

        self.len = self
            .len
            .checked_add(1)
            .expect("a list cannot hold more elements than virtual memory can fit");

        Ok(Cursor(inserted))
    }

    /// Inserts `value` in front of `at` and returns a cursor to it.
    ///
    /// Returns [`end()`][Self::end] (dropping the value) if the insertion failed, in which case
    /// the list is unchanged. See [`try_emplace()`][Self::try_emplace].
    pub fn emplace(&mut self, at: Cursor, value: T) -> Cursor {
        self.try_emplace(at, value).unwrap_or(Cursor(self.end))
    }

    /// Appends `value`, returning a cursor to it or [`end()`][Self::end] if the list is full.
    pub fn push_back(&mut self, value: T) -> Cursor {
        self.emplace(self.end(), value)
    }

    /// Prepends `value`, returning a cursor to it or [`end()`][Self::end] if the list is full.
    pub fn push_front(&mut self, value: T) -> Cursor {
        self.emplace(self.begin(), value)
    }

    /// Inserts every value in front of `at`, preserving their order.
    ///
    /// Stops at the first value that cannot be inserted. Returns the number of values inserted.
    pub fn insert_iter(&mut self, at: Cursor, values: impl IntoIterator<Item = T>) -> usize {
        let mut inserted: usize = 0;

        for value in values {
            if self.try_emplace(at, value).is_err() {
                break;
            }

            inserted = inserted.wrapping_add(1);
        }

        inserted
    }

    // Unlinks and destroys the node, returning its value and the cursor that followed it.
    pub(crate) fn unlink(&mut self, cursor: Cursor) -> Option<(T, Cursor)> {
        if self.len == 0 || cursor.0 == self.end || cursor.0 == self.head {
            return None;
        }

        let node = self.arena.take(cursor.0)?;

        self.node_mut(node.prev).next = node.next;
        self.node_mut(node.next).prev = node.prev;

        self.len = self
            .len
            .checked_sub(1)
            .expect("we just unlinked an element so len must be non-zero");

        let value = node
            .value
            .expect("only sentinels are valueless and we excluded them above");

        Some((value, Cursor(node.next)))
    }

    /// Erases the element at `cursor` and returns a cursor to the element that followed it.
    ///
    /// Does nothing and returns [`end()`][Self::end] if the list is empty or `cursor` is not an
    /// element of this list.
    pub fn erase(&mut self, cursor: Cursor) -> Cursor {
        match self.unlink(cursor) {
            Some((_, next)) => next,
            None => self.end(),
        }
    }

    /// Removes the element at `cursor` and returns it.
    pub fn remove(&mut self, cursor: Cursor) -> Option<T> {
        self.unlink(cursor).map(|(value, _)| value)
    }

    /// Removes and returns the first element.
    pub fn pop_front(&mut self) -> Option<T> {
        self.remove(self.begin())
    }

    /// Removes and returns the last element.
    pub fn pop_back(&mut self) -> Option<T> {
        self.remove(self.prev(self.end()))
    }

    /// Erases every element.
    pub fn clear(&mut self) {
        let mut cursor = self.node(self.head).next;

        while cursor != self.end {
            cursor = self
                .arena
                .take(cursor)
                .expect("list links only ever point at live nodes")
                .next;
        }

        let (head, end) = (self.head, self.end);
        self.node_mut(head).next = end;
        self.node_mut(end).prev = head;
        self.len = 0;
    }

    /// Iterates over the elements from front to back.
    pub fn iter(&self) -> ListIter<'_, T, A> {
        ListIter {
            list: self,
            front: self.node(self.head).next,
            back: self.node(self.end).prev,
            remaining: self.len,
        }
    }

    #[cfg_attr(test, mutants::skip)] // This is essentially test logic, mutation is meaningless.
    #[cfg(debug_assertions)]
    pub(crate) fn integrity_check(&self) {
        let mut observed_len: usize = 0;
        let mut previous = self.head;
        let mut cursor = self.node(self.head).next;

        while cursor != self.end {
            let node = self.node(cursor);

            assert_eq!(
                node.prev,
                previous,
                "node {cursor:?} does not link back to its predecessor in list of {}",
                type_name::<T>()
            );
            assert!(
                node.value.is_some(),
                "element node {cursor:?} has no value in list of {}",
                type_name::<T>()
            );

            observed_len = observed_len
                .checked_add(1)
                .expect("a list cannot hold more elements than virtual memory can fit");
            assert!(
                observed_len <= self.len,
                "next chain is longer than len {} in list of {}",
                self.len,
                type_name::<T>()
            );

            previous = cursor;
            cursor = node.next;
        }

        assert_eq!(
            self.node(self.end).prev,
            previous,
            "end sentinel does not link back to the last element in list of {}",
            type_name::<T>()
        );
        assert_eq!(
            observed_len,
            self.len,
            "next chain length does not match len in list of {}",
            type_name::<T>()
        );
        assert_eq!(
            Some(self.arena.len()),
            self.len.checked_add(2),
            "arena holds nodes that are not part of the list of {}",
            type_name::<T>()
        );
    }
}

impl<T, A: Arena<ListNode<T>> + Default> Default for List<T, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, A: Arena<ListNode<T>> + Default> Clone for List<T, A> {
    fn clone(&self) -> Self {
        let mut clone = Self::new();
        let end = clone.end();

        let inserted = clone.insert_iter(end, self.iter().cloned());

        assert_eq!(
            inserted,
            self.len,
            "storage of the same type must be able to hold the same number of {}",
            type_name::<T>()
        );

        clone
    }
}

impl<T: fmt::Debug, A: Arena<ListNode<T>>> fmt::Debug for List<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq, A: Arena<ListNode<T>>> PartialEq for List<T, A> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq, A: Arena<ListNode<T>>> Eq for List<T, A> {}

impl<T, A: Arena<ListNode<T>>> Extend<T> for List<T, A> {
    /// # Panics
    ///
    /// Panics if the list runs out of storage.
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            let end = self.end();

            assert!(
                self.try_emplace(end, value).is_ok(),
                "list storage exhausted while extending list of {}",
                type_name::<T>()
            );
        }
    }
}

impl<T, A: Arena<ListNode<T>> + Default> FromIterator<T> for List<T, A> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl<'a, T, A: Arena<ListNode<T>>> IntoIterator for &'a List<T, A> {
    type Item = &'a T;
    type IntoIter = ListIter<'a, T, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T, A: Arena<ListNode<T>>> IntoIterator for List<T, A> {
    type Item = T;
    type IntoIter = ListIntoIter<T, A>;

    fn into_iter(self) -> Self::IntoIter {
        ListIntoIter { list: self }
    }
}

/// Iterator over the elements of a [`List`], created by [`List::iter()`].
pub struct ListIter<'a, T, A: Arena<ListNode<T>>> {
    list: &'a List<T, A>,
    front: Handle,
    back: Handle,
    remaining: usize,
}

impl<'a, T, A: Arena<ListNode<T>>> Iterator for ListIter<'a, T, A> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }

        let node = self.list.node(self.front);
        self.front = node.next;
        self.remaining = self.remaining.wrapping_sub(1);

        node.value.as_ref()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T, A: Arena<ListNode<T>>> DoubleEndedIterator for ListIter<'a, T, A> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }

        let node = self.list.node(self.back);
        self.back = node.prev;
        self.remaining = self.remaining.wrapping_sub(1);

        node.value.as_ref()
    }
}

impl<T, A: Arena<ListNode<T>>> ExactSizeIterator for ListIter<'_, T, A> {}

impl<T, A: Arena<ListNode<T>>> FusedIterator for ListIter<'_, T, A> {}

impl<T, A: Arena<ListNode<T>>> Clone for ListIter<'_, T, A> {
    fn clone(&self) -> Self {
        Self {
            list: self.list,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<T, A: Arena<ListNode<T>>> fmt::Debug for ListIter<'_, T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListIter")
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}

/// Owning iterator over the elements of a [`List`].
pub struct ListIntoIter<T, A: Arena<ListNode<T>>> {
    list: List<T, A>,
}

impl<T, A: Arena<ListNode<T>>> Iterator for ListIntoIter<T, A> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.list.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.list.len(), Some(self.list.len()))
    }
}

impl<T, A: Arena<ListNode<T>>> DoubleEndedIterator for ListIntoIter<T, A> {
    fn next_back(&mut self) -> Option<T> {
        self.list.pop_back()
    }
}

impl<T, A: Arena<ListNode<T>>> ExactSizeIterator for ListIntoIter<T, A> {}

impl<T, A: Arena<ListNode<T>>> FusedIterator for ListIntoIter<T, A> {}

impl<T: fmt::Debug, A: Arena<ListNode<T>>> fmt::Debug for ListIntoIter<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ListIntoIter").field(&self.list).finish()
    }
}
