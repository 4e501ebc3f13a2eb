use std::any::type_name;
use std::fmt;
use std::mem::MaybeUninit;

use tracing::trace;

use crate::{Arena, Handle, OwnerId};

/// An arena with room for exactly `N` objects, stored inline in the arena itself.
///
/// The arena never touches dynamic memory, which makes it suitable for environments without a
/// heap. Next to the slots it keeps an availability mask with one flag per slot; creating an
/// object takes the lowest-index vacant slot and destroying one makes its slot available again.
///
/// As the objects live inside the arena value, the arena is not relocatable.
///
/// # Examples
///
/// ```
/// use arena_collections::{Arena, FixedArena};
///
/// let mut arena = FixedArena::<String, 2>::new();
///
/// let a = arena.create("a".to_string()).unwrap();
/// let b = arena.create("b".to_string()).unwrap();
/// assert!(arena.create("c".to_string()).is_none());
///
/// assert!(arena.destroy(a));
/// assert!(!arena.destroy(a));
///
/// assert_eq!(arena.get(b).map(String::as_str), Some("b"));
/// ```
pub struct FixedArena<T, const N: usize> {
    owner: OwnerId,
    slots: [MaybeUninit<T>; N],

    // `occupied[i]` is set if and only if `slots[i]` holds an initialized object.
    occupied: [bool; N],

    // Number of set flags in `occupied`.
    count: usize,
}

impl<T, const N: usize> FixedArena<T, N> {
    /// Creates an arena with all `N` slots vacant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            owner: OwnerId::next(),
            slots: [const { MaybeUninit::uninit() }; N],
            occupied: [false; N],
            count: 0,
        }
    }

    /// Whether every slot is occupied.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.count == N
    }

    /// Index of the occupied slot the handle points to, if any.
    fn occupied_index(&self, handle: Handle) -> Option<usize> {
        if handle.owner() != self.owner {
            return None;
        }

        let index = handle.index();
        (*self.occupied.get(index)?).then_some(index)
    }

    #[cfg(debug_assertions)]
    #[cfg_attr(test, mutants::skip)]
    fn integrity_check(&self) {
        let set = self.occupied.iter().filter(|flag| **flag).count();

        assert_eq!(
            set,
            self.count,
            "availability mask of {} disagrees with its object count",
            type_name::<Self>()
        );
    }
}

impl<T, const N: usize> Default for FixedArena<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Drop for FixedArena<T, N> {
    fn drop(&mut self) {
        for (slot, occupied) in self.slots.iter_mut().zip(self.occupied) {
            if occupied {
                // SAFETY: The mask says the slot holds an initialized object, and the arena is
                // going away so nothing can observe the slot afterwards.
                unsafe {
                    slot.assume_init_drop();
                }
            }
        }
    }
}

impl<T, const N: usize> fmt::Debug for FixedArena<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedArena")
            .field("item_type", &format_args!("{}", type_name::<T>()))
            .field("owner", &self.owner)
            .field("len", &self.count)
            .field("capacity", &N)
            .finish_non_exhaustive()
    }
}

impl<T, const N: usize> Arena<T> for FixedArena<T, N> {
    const RELOCATABLE: bool = false;

    fn owner(&self) -> OwnerId {
        self.owner
    }

    fn create(&mut self, value: T) -> Option<Handle> {
        let Some(index) = self.occupied.iter().position(|occupied| !occupied) else {
            trace!(
                capacity = N,
                item_type = type_name::<T>(),
                "fixed arena is full"
            );
            return None;
        };

        self.slots.get_mut(index)?.write(value);
        *self.occupied.get_mut(index)? = true;

        self.count = self
            .count
            .checked_add(1)
            .expect("guarded by count < N, as we found a vacant slot");

        #[cfg(debug_assertions)]
        self.integrity_check();

        Some(Handle::new(self.owner, index))
    }

    fn take(&mut self, handle: Handle) -> Option<T> {
        let index = self.occupied_index(handle)?;

        *self.occupied.get_mut(index)? = false;

        // SAFETY: The mask said the slot was occupied and we just cleared its flag, so the
        // object is read out exactly once.
        let value = unsafe { self.slots.get(index)?.assume_init_read() };

        self.count = self
            .count
            .checked_sub(1)
            .expect("we just vacated an occupied slot so count must be non-zero");

        #[cfg(debug_assertions)]
        self.integrity_check();

        Some(value)
    }

    fn get(&self, handle: Handle) -> Option<&T> {
        let slot = self.slots.get(self.occupied_index(handle)?)?;

        // SAFETY: The mask says the slot holds an initialized object.
        Some(unsafe { slot.assume_init_ref() })
    }

    fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        let index = self.occupied_index(handle)?;
        let slot = self.slots.get_mut(index)?;

        // SAFETY: The mask says the slot holds an initialized object.
        Some(unsafe { slot.assume_init_mut() })
    }

    fn len(&self) -> usize {
        self.count
    }

    fn capacity(&self) -> Option<usize> {
        Some(N)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::Cell;
    use std::mem;
    use std::rc::Rc;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;
    use crate::Error;

    assert_impl_all!(FixedArena<u32, 4>: Send, Sync);
    assert_not_impl_any!(FixedArena<Rc<u32>, 4>: Send, Sync);

    #[test]
    fn mask_tracks_occupancy() {
        let mut arena = FixedArena::<u32, 3>::new();

        let a = arena.create(1).unwrap();
        let b = arena.create(2).unwrap();
        assert_eq!(arena.occupied, [true, true, false]);

        assert_eq!(arena.take(a), Some(1));
        assert_eq!(arena.occupied, [false, true, false]);

        assert_eq!(arena.get_mut(b).map(|value| mem::replace(value, 20)), Some(2));
        assert_eq!(arena.get(b), Some(&20));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn smoke_test() {
        let mut arena = FixedArena::<u32, 3>::new();

        let a = arena.create(42).unwrap();
        let b = arena.create(43).unwrap();
        let c = arena.create(44).unwrap();

        assert_eq!(arena.get(a), Some(&42));
        assert_eq!(arena.get(b), Some(&43));
        assert_eq!(arena.get(c), Some(&44));
        assert_eq!(arena.len(), 3);
        assert!(arena.is_full());
    }

    #[test]
    fn full_arena_refuses_until_slot_freed() {
        let mut arena = FixedArena::<u32, 3>::new();

        let _a = arena.create(1).unwrap();
        let b = arena.create(2).unwrap();
        let _c = arena.create(3).unwrap();

        assert!(arena.create(4).is_none());

        assert!(arena.destroy(b));

        let d = arena.create(5).unwrap();
        assert_eq!(d.index(), b.index());
        assert!(arena.create(6).is_none());
    }

    #[test]
    fn takes_lowest_vacant_slot() {
        let mut arena = FixedArena::<u32, 4>::new();

        let handles: Vec<_> = (0..4).map(|i| arena.create(i).unwrap()).collect();

        assert!(arena.destroy(handles[3]));
        assert!(arena.destroy(handles[1]));

        assert_eq!(arena.create(10).unwrap().index(), 1);
        assert_eq!(arena.create(11).unwrap().index(), 3);
    }

    #[test]
    fn stale_handle_is_rejected() {
        let mut arena = FixedArena::<u32, 2>::new();

        let a = arena.create(1).unwrap();
        assert!(arena.destroy(a));

        assert!(!arena.destroy(a));
        assert_eq!(arena.get(a), None);
        assert_eq!(arena.try_destroy(a), Err(Error::InvalidOwnership));
        assert!(arena.is_empty());
    }

    #[test]
    fn foreign_handle_is_rejected() {
        let mut a = FixedArena::<u32, 2>::new();
        let mut b = FixedArena::<u32, 2>::new();

        let handle = a.create(1).unwrap();
        let _ = b.create(2).unwrap();

        assert!(!b.destroy(handle));
        assert_eq!(b.len(), 1);
        assert!(!b.contains(handle));
        assert!(a.contains(handle));
    }

    #[test]
    fn out_of_range_handle_is_rejected() {
        let mut arena = FixedArena::<u32, 2>::new();

        let forged = Handle::new(arena.owner(), 5);
        assert!(!arena.destroy(forged));
        assert_eq!(arena.get_mut(forged), None);
    }

    #[test]
    fn try_create_reports_exhaustion() {
        let mut arena = FixedArena::<u32, 1>::new();

        arena.try_create(1).unwrap();
        assert_eq!(arena.try_create(2), Err(Error::CapacityExhausted));
    }

    #[test]
    fn destroy_runs_destructor() {
        struct Droppable(Rc<Cell<bool>>);

        impl Drop for Droppable {
            fn drop(&mut self) {
                self.0.set(true);
            }
        }

        let dropped = Rc::new(Cell::new(false));
        let mut arena = FixedArena::<Droppable, 2>::new();

        let handle = arena.create(Droppable(Rc::clone(&dropped))).unwrap();
        assert!(!dropped.get());

        assert!(arena.destroy(handle));
        assert!(dropped.get());
    }

    #[test]
    fn drop_releases_remaining_objects() {
        let value = Rc::new(());

        {
            let mut arena = FixedArena::<Rc<()>, 2>::new();
            arena.create(Rc::clone(&value)).unwrap();
            arena.create(Rc::clone(&value)).unwrap();
            assert_eq!(Rc::strong_count(&value), 3);
        }

        assert_eq!(Rc::strong_count(&value), 1);
    }
}
