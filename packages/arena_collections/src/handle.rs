use std::sync::atomic::{self, AtomicU64};

/// Identity of one storage instance (an arena or a fixed allocator).
///
/// Every instance receives a process-unique identity on creation. Handles and blocks carry the
/// identity of the instance that issued them, which lets a storage provider reject handles it
/// does not own instead of corrupting its own state.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct OwnerId(u64);

static NEXT_OWNER_ID: AtomicU64 = AtomicU64::new(0);

impl OwnerId {
    pub(crate) fn next() -> Self {
        // Relaxed is enough, we only need uniqueness, not ordering with other memory.
        let id = NEXT_OWNER_ID.fetch_add(1, atomic::Ordering::Relaxed);

        assert!(id != u64::MAX, "ran out of storage identities");

        Self(id)
    }
}

/// A weak, copyable reference to an object living in an [`Arena`][crate::Arena].
///
/// A handle does not own the object and does not keep it alive. The arena validates every handle
/// it receives, so a handle that outlived its object, or that was issued by a different arena,
/// is simply rejected.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Handle {
    owner: OwnerId,
    index: usize,
}

impl Handle {
    pub(crate) fn new(owner: OwnerId, index: usize) -> Self {
        Self { owner, index }
    }

    /// The identity of the arena that issued this handle.
    #[must_use]
    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    /// The slot index of the object inside its arena.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Handle: Send, Sync, Copy);

    #[test]
    fn owner_ids_are_unique() {
        let a = OwnerId::next();
        let b = OwnerId::next();

        assert_ne!(a, b);
    }

    #[test]
    fn handles_compare_by_owner_and_index() {
        let owner = OwnerId::next();
        let other = OwnerId::next();

        assert_eq!(Handle::new(owner, 3), Handle::new(owner, 3));
        assert_ne!(Handle::new(owner, 3), Handle::new(owner, 4));
        assert_ne!(Handle::new(owner, 3), Handle::new(other, 3));
    }
}
