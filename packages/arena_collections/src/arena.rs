use crate::{Error, Handle, OwnerId, Result};

/// Owner of individually created and destroyed objects of type `T`.
///
/// An arena hands out a [`Handle`] for every object it creates. Handles are weak: they do not
/// keep the object alive and the arena checks every handle it is given. A handle that was issued
/// by a different arena, or whose object has already been destroyed, is rejected without any
/// change to the arena. Slots are reused, so once a later object takes over the slot, an old
/// handle to that slot denotes the new object.
///
/// Creation is fallible. An arena with bounded capacity returns `None` from
/// [`create()`][Self::create] when it is full and callers are expected to report that onwards,
/// not to retry.
pub trait Arena<T> {
    /// Whether the arena can change owner by handle copy, in O(1).
    ///
    /// Arenas whose storage lives inline in the arena value are not relocatable: moving the
    /// arena moves every object. Containers check this to decide between adopting an arena
    /// wholesale and moving its objects one at a time.
    const RELOCATABLE: bool;

    /// The identity of this arena, carried by every handle it issues.
    fn owner(&self) -> OwnerId;

    /// Moves `value` into a new object and returns its handle.
    ///
    /// Returns `None` (dropping the value) if the arena has no room left.
    fn create(&mut self, value: T) -> Option<Handle>;

    /// Removes the object and returns its value.
    ///
    /// Returns `None` and changes nothing if the handle does not denote a live object of
    /// this arena.
    fn take(&mut self, handle: Handle) -> Option<T>;

    /// A reference to the object, if the handle denotes a live object of this arena.
    fn get(&self, handle: Handle) -> Option<&T>;

    /// An exclusive reference to the object, if the handle denotes a live object of this arena.
    fn get_mut(&mut self, handle: Handle) -> Option<&mut T>;

    /// The number of live objects.
    fn len(&self) -> usize;

    /// The maximum number of live objects, or `None` if the arena is only bounded by memory.
    fn capacity(&self) -> Option<usize>;

    /// Destroys the object, running its destructor.
    ///
    /// Returns `false` and changes nothing if the handle does not denote a live object of
    /// this arena.
    fn destroy(&mut self, handle: Handle) -> bool {
        self.take(handle).is_some()
    }

    /// Whether the arena holds no objects.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the handle denotes a live object of this arena.
    fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// Like [`create()`][Self::create] but reports exhaustion as an error.
    ///
    /// # Errors
    ///
    /// [`Error::CapacityExhausted`] if the arena has no room left.
    fn try_create(&mut self, value: T) -> Result<Handle> {
        self.create(value).ok_or(Error::CapacityExhausted)
    }

    /// Like [`destroy()`][Self::destroy] but reports a rejected handle as an error.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidOwnership`] if the handle does not denote a live object of this arena.
    fn try_destroy(&mut self, handle: Handle) -> Result<()> {
        if self.destroy(handle) {
            Ok(())
        } else {
            Err(Error::InvalidOwnership)
        }
    }
}
