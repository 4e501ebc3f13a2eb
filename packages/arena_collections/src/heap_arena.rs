use std::any::type_name;
use std::{fmt, mem};

use crate::{Arena, Handle, OwnerId};

/// An arena that places every object in its own heap allocation.
///
/// Creation and destruction pass straight through to the global allocator; the arena only keeps
/// a table of the live allocations so it can validate the handles it receives. The table is an
/// intrusive freelist, so the slots of destroyed objects are reused by later objects.
///
/// Objects never move once created and the arena value is just a handle to heap memory, so the
/// arena is relocatable.
///
/// # Examples
///
/// ```
/// use arena_collections::{Arena, HeapArena};
///
/// let mut arena = HeapArena::new();
///
/// let handle = arena.create(vec![1, 2, 3]).unwrap();
/// assert_eq!(arena.get(handle).map(Vec::len), Some(3));
///
/// assert!(arena.destroy(handle));
/// assert!(arena.is_empty());
/// ```
pub struct HeapArena<T> {
    owner: OwnerId,
    entries: Vec<Entry<T>>,

    /// Index of the most recently vacated entry. Think of this as a stack of vacant entries,
    /// with the stack links stored in the entries themselves. Equal to `entries.len()` if there
    /// are no vacant entries.
    next_free_index: usize,

    count: usize,
}

enum Entry<T> {
    Occupied(Box<T>),
    Vacant { next_free_index: usize },
}

impl<T> HeapArena<T> {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self {
            owner: OwnerId::next(),
            entries: Vec::new(),
            next_free_index: 0,
            count: 0,
        }
    }

    fn entry_index(&self, handle: Handle) -> Option<usize> {
        (handle.owner() == self.owner).then_some(handle.index())
    }
}

impl<T> Default for HeapArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for HeapArena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeapArena")
            .field("item_type", &format_args!("{}", type_name::<T>()))
            .field("owner", &self.owner)
            .field("len", &self.count)
            .finish_non_exhaustive()
    }
}

impl<T> Arena<T> for HeapArena<T> {
    const RELOCATABLE: bool = true;

    fn owner(&self) -> OwnerId {
        self.owner
    }

    fn create(&mut self, value: T) -> Option<Handle> {
        let index = self.next_free_index;
        let object = Entry::Occupied(Box::new(value));

        match self.entries.get_mut(index) {
            Some(entry) => {
                let previous = mem::replace(entry, object);

                let Entry::Vacant { next_free_index } = previous else {
                    panic!(
                        "entry {index} was not vacant when we created an object in it in arena of {}",
                        type_name::<T>()
                    );
                };

                self.next_free_index = next_free_index;
            }
            None => {
                self.entries.push(object);
                self.next_free_index = self.entries.len();
            }
        }

        self.count = self
            .count
            .checked_add(1)
            .expect("an arena cannot hold more objects than virtual memory can fit");

        Some(Handle::new(self.owner, index))
    }

    fn take(&mut self, handle: Handle) -> Option<T> {
        let index = self.entry_index(handle)?;
        let next_free_index = self.next_free_index;
        let entry = self.entries.get_mut(index)?;

        if matches!(entry, Entry::Vacant { .. }) {
            return None;
        }

        let Entry::Occupied(object) = mem::replace(entry, Entry::Vacant { next_free_index })
        else {
            unreachable!("we checked above that the entry is occupied");
        };

        // Push the vacated entry onto the free stack.
        self.next_free_index = index;

        self.count = self
            .count
            .checked_sub(1)
            .expect("we just vacated an occupied entry so count must be non-zero");

        Some(*object)
    }

    fn get(&self, handle: Handle) -> Option<&T> {
        match self.entries.get(self.entry_index(handle)?)? {
            Entry::Occupied(object) => Some(object),
            Entry::Vacant { .. } => None,
        }
    }

    fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        let index = self.entry_index(handle)?;

        match self.entries.get_mut(index)? {
            Entry::Occupied(object) => Some(object),
            Entry::Vacant { .. } => None,
        }
    }

    fn len(&self) -> usize {
        self.count
    }

    fn capacity(&self) -> Option<usize> {
        None
    }
}
