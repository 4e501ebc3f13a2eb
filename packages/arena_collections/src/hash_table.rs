use std::any::type_name;
use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;
use std::mem;
use std::num::NonZero;

use new_zealand::nz;
use tracing::debug;

use crate::{Allocator, Arena, Cursor, Error, List, ListIter, ListNode, Result, Vector};

/// The number of bins a table starts with unless configured otherwise.
pub(crate) const DEFAULT_INITIAL_BINS: NonZero<usize> = nz!(10);

// The table grows when an insert would take it above `len / bins == 3 / 4`.
const MAX_LOAD_NUMERATOR: usize = 3;
const MAX_LOAD_DENOMINATOR: usize = 4;

/// The bookkeeping record of one bin of a hash map or hash set.
///
/// All entries of a table live in one shared list. The entries of a bin form a contiguous range
/// of that list, starting at `front` and spanning `count` entries. An empty bin has a count of
/// zero and its `front` is the end cursor of the list.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Bucket {
    front: Cursor,
    count: usize,
}

impl Bucket {
    fn empty(end: Cursor) -> Self {
        Self {
            front: end,
            count: 0,
        }
    }

    /// The first entry of the bin, or the end cursor if the bin is empty.
    #[must_use]
    pub fn front(&self) -> Cursor {
        self.front
    }

    /// The number of entries in the bin.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Whether the bin has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Picks the key out of a stored entry.
pub(crate) trait KeyExtractor<T> {
    type Key: Hash + Eq;

    fn key(entry: &T) -> &Self::Key;
}

/// Map entries are key-value pairs keyed by the first member.
pub(crate) struct FirstOfPair;

impl<K: Hash + Eq, V> KeyExtractor<(K, V)> for FirstOfPair {
    type Key = K;

    fn key(entry: &(K, V)) -> &K {
        &entry.0
    }
}

/// Set entries are their own keys.
pub(crate) struct Identity;

impl<K: Hash + Eq> KeyExtractor<K> for Identity {
    type Key = K;

    fn key(entry: &K) -> &K {
        entry
    }
}

/// Separate chaining over a single shared list.
///
/// Every entry is a node of `entries`. Each bin owns a contiguous range of the list, described by
/// its [`Bucket`] record. A new entry is inserted in front of the first entry of its bin, which is
/// exactly the boundary between that bin's range and whatever precedes it, so no other range is
/// disturbed. Because the ranges are delimited by counts rather than by list boundaries, a lookup
/// scans exactly `count` nodes.
///
/// The map and set facades supply the extractor that pulls the key out of their entry type.
pub(crate) struct HashTable<T, X, A, B, S>
where
    A: Arena<ListNode<T>>,
    B: Allocator<Bucket>,
{
    entries: List<T, A>,
    buckets: Vector<Bucket, B>,
    hasher: S,

    // The bin count a fresh table of this configuration starts with.
    initial_bins: NonZero<usize>,

    _extractor: PhantomData<fn() -> X>,
}

impl<T, X, A, B, S> HashTable<T, X, A, B, S>
where
    X: KeyExtractor<T>,
    A: Arena<ListNode<T>> + Default,
    B: Allocator<Bucket> + Default,
    S: BuildHasher,
{
    /// Creates an empty table.
    ///
    /// Without an explicit bin count, the table starts with the default bin count or as many
    /// bins as the bucket storage can hold, whichever is smaller.
    ///
    /// # Panics
    ///
    /// Panics if the bucket storage cannot hold the requested number of bins (at least one).
    pub(crate) fn new(initial_bins: Option<NonZero<usize>>, hasher: S) -> Self {
        let entries = List::<T, A>::new();
        let mut buckets = Vector::<Bucket, B>::new();

        let initial_bins = initial_bins.unwrap_or_else(|| {
            NonZero::new(DEFAULT_INITIAL_BINS.get().min(buckets.max_size()))
                .expect("bucket storage must have room for at least one bin")
        });

        assert!(
            buckets.resize(initial_bins.get(), Bucket::empty(entries.end())),
            "bucket storage {} cannot hold {initial_bins} bins",
            type_name::<B>()
        );

        Self {
            entries,
            buckets,
            hasher,
            initial_bins,
            _extractor: PhantomData,
        }
    }

    /// Grows the table to `bins` bins, redistributing every entry.
    ///
    /// Tables never shrink, so a request for no more bins than there already are does nothing.
    /// On failure the table keeps its current bins and entries and remains fully usable.
    pub(crate) fn rehash(&mut self, bins: usize) -> Result<()> {
        let from_bins = self.num_bins();

        if bins <= from_bins {
            return Ok(());
        }

        debug!(
            from_bins,
            to_bins = bins,
            len = self.len(),
            item_type = type_name::<T>(),
            "rehashing"
        );

        if !self.buckets.resize(bins, Bucket::empty(self.entries.end())) {
            debug!(
                from_bins,
                to_bins = bins,
                len = self.len(),
                item_type = type_name::<T>(),
                "rehash failed because bucket storage is exhausted"
            );
            return Err(Error::CapacityExhausted);
        }

        let mut drained = self.entries.take();

        let end = self.entries.end();
        for bucket in self.buckets.as_mut_slice() {
            *bucket = Bucket::empty(end);
        }

        while let Some(entry) = drained.pop_front() {
            let bin = self.bin_of(X::key(&entry));

            self.link(bin, entry)
                .expect("every entry fit before the rehash, so every entry fits after it");
        }

        debug!(bins, len = self.len(), "rehash complete");

        Ok(())
    }

    /// Inserts an entry whose key is not yet in the table.
    ///
    /// Grows the table first if the new entry would exceed the maximum load factor, so the
    /// returned cursor stays valid after this call returns. A failed growth is not an error;
    /// the entry is still inserted if there is room for it.
    ///
    /// If the entry arena has no room for the entry, the table is left untouched.
    pub(crate) fn insert_new(&mut self, entry: T) -> Result<Cursor> {
        debug_assert!(
            self.find(X::key(&entry)).is_none(),
            "insert_new() called with a key that is already present"
        );

        let arena = self.entries.arena();
        if arena
            .capacity()
            .is_some_and(|capacity| arena.len() >= capacity)
        {
            return Err(Error::CapacityExhausted);
        }

        let required = self
            .len()
            .checked_add(1)
            .expect("a table cannot hold more entries than virtual memory can fit");

        let bins = self.num_bins();

        if required.saturating_mul(MAX_LOAD_DENOMINATOR) > bins.saturating_mul(MAX_LOAD_NUMERATOR)
        {
            // Failure is already logged and leaves the table usable, just more crowded.
            _ = self.rehash(bins.saturating_mul(2));
        }

        let bin = self.bin_of(X::key(&entry));
        self.link(bin, entry)
    }

    /// Moves every entry into a new table, leaving this one empty.
    ///
    /// If both the entry arena and the bucket storage are relocatable, the new table adopts them
    /// as they are and every cursor now points into the new table. Otherwise, every entry moves
    /// into storage of the new table and cursors into this table do not carry over.
    pub(crate) fn take(&mut self) -> Self
    where
        S: Clone,
    {
        if A::RELOCATABLE && B::RELOCATABLE {
            let fresh = Self::new(Some(self.initial_bins), self.hasher.clone());
            return mem::replace(self, fresh);
        }

        let mut moved = Self::new(NonZero::new(self.num_bins()), self.hasher.clone());
        moved.initial_bins = self.initial_bins;

        while let Some(entry) = self.entries.pop_front() {
            let bin = moved.bin_of(X::key(&entry));

            moved
                .link(bin, entry)
                .expect("storage of the same type must be able to hold the same entries");
        }

        self.clear();
        moved
    }

    pub(crate) fn clone_table(&self) -> Self
    where
        T: Clone,
        S: Clone,
    {
        let mut clone = Self::new(NonZero::new(self.num_bins()), self.hasher.clone());
        clone.initial_bins = self.initial_bins;

        for entry in &self.entries {
            let bin = clone.bin_of(X::key(entry));

            clone
                .link(bin, entry.clone())
                .expect("storage of the same type must be able to hold the same entries");
        }

        clone
    }
}

impl<T, X, A, B, S> HashTable<T, X, A, B, S>
where
    X: KeyExtractor<T>,
    A: Arena<ListNode<T>>,
    B: Allocator<Bucket>,
    S: BuildHasher,
{
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn num_bins(&self) -> usize {
        self.buckets.len()
    }

    pub(crate) fn bucket(&self, bin: usize) -> Option<Bucket> {
        self.buckets.get(bin).copied()
    }

    #[expect(
        clippy::cast_precision_loss,
        reason = "the load factor is informational, precision loss on huge tables is acceptable"
    )]
    pub(crate) fn load_factor(&self) -> f64 {
        self.len() as f64 / self.num_bins() as f64
    }

    pub(crate) fn hasher(&self) -> &S {
        &self.hasher
    }

    pub(crate) fn entries(&self) -> &List<T, A> {
        &self.entries
    }

    pub(crate) fn iter(&self) -> ListIter<'_, T, A> {
        self.entries.iter()
    }

    pub(crate) fn into_entries(self) -> List<T, A> {
        self.entries
    }

    /// The bin that `key` belongs to.
    pub(crate) fn bin_of<Q>(&self, key: &Q) -> usize
    where
        Q: Hash + ?Sized,
    {
        let bins =
            NonZero::new(self.num_bins()).expect("a hash table always has at least one bin");

        // Dropping high bits of the hash on narrow targets still leaves a valid bin choice.
        #[expect(
            clippy::cast_possible_truncation,
            reason = "only the remainder matters and it is below the bin count"
        )]
        let hash = self.hasher.hash_one(key) as usize;

        hash % bins
    }

    fn bucket_mut(&mut self, bin: usize) -> &mut Bucket {
        self.buckets
            .get_mut(bin)
            .expect("bins are always computed modulo the bin count")
    }

    /// The cursor of the entry with the given key, if present.
    pub(crate) fn find<Q>(&self, key: &Q) -> Option<Cursor>
    where
        X::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let bucket = self
            .bucket(self.bin_of(key))
            .expect("bins are always computed modulo the bin count");

        let mut cursor = bucket.front;

        for _ in 0..bucket.count {
            let entry = self
                .entries
                .get(cursor)
                .expect("bucket ranges only ever cover live entries");

            if X::key(entry).borrow() == key {
                return Some(cursor);
            }

            cursor = self.entries.next(cursor);
        }

        None
    }

    pub(crate) fn get<Q>(&self, key: &Q) -> Option<&T>
    where
        X::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(self.find(key)?)
    }

    pub(crate) fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut T>
    where
        X::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let cursor = self.find(key)?;
        self.entries.get_mut(cursor)
    }

    pub(crate) fn get_at(&self, cursor: Cursor) -> Option<&T> {
        self.entries.get(cursor)
    }

    pub(crate) fn get_at_mut(&mut self, cursor: Cursor) -> Option<&mut T> {
        self.entries.get_mut(cursor)
    }

    // Inserts the entry at the front of the bin's range.
    fn link(&mut self, bin: usize, entry: T) -> Result<Cursor> {
        let front = self.bucket_mut(bin).front;

        let cursor = self.entries.try_emplace(front, entry)?;

        let bucket = self.bucket_mut(bin);
        bucket.front = cursor;
        bucket.count = bucket
            .count
            .checked_add(1)
            .expect("a bin cannot hold more entries than the table");

        Ok(cursor)
    }

    /// Removes the entry at `cursor`, returning it and the cursor of the entry that followed it.
    pub(crate) fn remove_at(&mut self, cursor: Cursor) -> Option<(T, Cursor)> {
        let bin = self.bin_of(X::key(self.entries.get(cursor)?));

        let (entry, next) = self
            .entries
            .unlink(cursor)
            .expect("we just resolved the cursor to a live entry");

        let end = self.entries.end();
        let bucket = self.bucket_mut(bin);

        bucket.count = bucket
            .count
            .checked_sub(1)
            .expect("a bin with a live entry must have a non-zero count");

        if bucket.count == 0 {
            bucket.front = end;
        } else if bucket.front == cursor {
            // The rest of the bin's range follows contiguously.
            bucket.front = next;
        }

        Some((entry, next))
    }

    pub(crate) fn remove<Q>(&mut self, key: &Q) -> Option<T>
    where
        X::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let cursor = self.find(key)?;
        self.remove_at(cursor).map(|(entry, _)| entry)
    }

    /// Removes every entry, keeping the current bin count.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();

        let end = self.entries.end();
        for bucket in self.buckets.as_mut_slice() {
            *bucket = Bucket::empty(end);
        }
    }

    #[cfg_attr(test, mutants::skip)] // This is essentially test logic, mutation is meaningless.
    #[cfg(debug_assertions)]
    pub(crate) fn integrity_check(&self) {
        self.entries.integrity_check();

        let mut total: usize = 0;

        for (bin, bucket) in self.buckets.iter().enumerate() {
            if bucket.count == 0 {
                assert_eq!(
                    bucket.front,
                    self.entries.end(),
                    "empty bin {bin} does not point at the end of the list of {}",
                    type_name::<T>()
                );
                continue;
            }

            let mut cursor = bucket.front;

            for _ in 0..bucket.count {
                let entry = self.entries.get(cursor).unwrap_or_else(|| {
                    panic!(
                        "bin {bin} covers a position that is not a live entry in table of {}",
                        type_name::<T>()
                    )
                });

                assert_eq!(
                    self.bin_of(X::key(entry)),
                    bin,
                    "bin {bin} covers an entry that belongs to another bin in table of {}",
                    type_name::<T>()
                );

                cursor = self.entries.next(cursor);
            }

            total = total
                .checked_add(bucket.count)
                .expect("bin counts cannot exceed the number of live entries");
        }

        // Every covered entry hashes to the bin covering it, so no entry is covered twice.
        assert_eq!(
            total,
            self.len(),
            "bin counts do not add up to the number of entries in table of {}",
            type_name::<T>()
        );
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::hash::{BuildHasherDefault, Hasher};

    use super::*;
    use crate::{FixedAllocator, FixedArena, FnvBuildHasher, HeapAllocator, HeapArena};

    type HeapSetTable<K> =
        HashTable<K, Identity, HeapArena<ListNode<K>>, HeapAllocator<Bucket>, FnvBuildHasher>;

    type FixedSetTable<K, const SLOTS: usize, const BINS: usize> = HashTable<
        K,
        Identity,
        FixedArena<ListNode<K>, SLOTS>,
        FixedAllocator<Bucket, BINS>,
        FnvBuildHasher,
    >;

    /// Hashes every integer to itself, so bin placement is predictable.
    #[derive(Default)]
    struct IdentityHasher(u64);

    impl Hasher for IdentityHasher {
        fn write(&mut self, _bytes: &[u8]) {
            unreachable!("only used with integer keys");
        }

        fn write_u64(&mut self, value: u64) {
            self.0 = value;
        }

        fn finish(&self) -> u64 {
            self.0
        }
    }

    type PredictableTable = HashTable<
        u64,
        Identity,
        HeapArena<ListNode<u64>>,
        HeapAllocator<Bucket>,
        BuildHasherDefault<IdentityHasher>,
    >;

    fn bin_contents(table: &PredictableTable, bin: usize) -> Vec<u64> {
        let bucket = table.bucket(bin).unwrap();
        let mut cursor = bucket.front();
        let mut contents = Vec::new();

        for _ in 0..bucket.count() {
            contents.push(*table.get_at(cursor).unwrap());
            cursor = table.entries().next(cursor);
        }

        contents
    }

    #[test]
    fn starts_with_default_bins() {
        let table = HeapSetTable::<u32>::new(None, FnvBuildHasher);

        assert_eq!(table.num_bins(), DEFAULT_INITIAL_BINS.get());
        assert_eq!(table.len(), 0);
        table.integrity_check();
    }

    #[test]
    fn default_bins_are_limited_by_fixed_storage() {
        let table = FixedSetTable::<u32, 8, 4>::new(None, FnvBuildHasher);

        assert_eq!(table.num_bins(), 4);
    }

    #[test]
    #[should_panic]
    fn explicit_bins_beyond_fixed_storage_panics() {
        drop(FixedSetTable::<u32, 8, 4>::new(Some(nz!(5)), FnvBuildHasher));
    }

    #[test]
    fn grows_before_exceeding_load_factor() {
        let mut table = HeapSetTable::<u32>::new(None, FnvBuildHasher);

        for key in 0..7 {
            table.insert_new(key).unwrap();
        }
        assert_eq!(table.num_bins(), 10);

        table.insert_new(7).unwrap();
        assert_eq!(table.num_bins(), 20);

        for key in 0..8 {
            assert!(table.find(&key).is_some());
        }
        table.integrity_check();
    }

    #[test]
    fn cursor_from_growing_insert_is_valid() {
        let mut table = HeapSetTable::<u32>::new(None, FnvBuildHasher);

        for key in 0..7 {
            table.insert_new(key).unwrap();
        }

        let cursor = table.insert_new(7).unwrap();
        assert_eq!(table.get_at(cursor), Some(&7));
    }

    #[test]
    fn new_entries_go_to_front_of_bin() {
        let mut table = PredictableTable::new(Some(nz!(100)), BuildHasherDefault::default());

        table.insert_new(3).unwrap();
        table.insert_new(103).unwrap();
        table.insert_new(203).unwrap();
        table.insert_new(4).unwrap();

        assert_eq!(bin_contents(&table, 3), vec![203, 103, 3]);
        assert_eq!(bin_contents(&table, 4), vec![4]);
        table.integrity_check();
    }

    #[test]
    fn erase_front_advances_bin() {
        let mut table = PredictableTable::new(Some(nz!(100)), BuildHasherDefault::default());

        for key in [3, 103, 203] {
            table.insert_new(key).unwrap();
        }

        let front = table.bucket(3).unwrap().front();
        let (removed, next) = table.remove_at(front).unwrap();

        assert_eq!(removed, 203);
        assert_eq!(table.bucket(3).unwrap().front(), next);
        assert_eq!(bin_contents(&table, 3), vec![103, 3]);
        table.integrity_check();
    }

    #[test]
    fn erase_non_front_keeps_bin_front() {
        let mut table = PredictableTable::new(Some(nz!(100)), BuildHasherDefault::default());

        for key in [3, 103, 203] {
            table.insert_new(key).unwrap();
        }
        // Another bin directly follows bin 3 in the list.
        table.insert_new(4).unwrap();

        let front = table.bucket(3).unwrap().front();
        let last = table.find(&3).unwrap();
        table.remove_at(last).unwrap();

        assert_eq!(table.bucket(3).unwrap().front(), front);
        assert_eq!(bin_contents(&table, 3), vec![203, 103]);
        assert_eq!(bin_contents(&table, 4), vec![4]);
        table.integrity_check();
    }

    #[test]
    fn erase_last_in_bin_empties_bin() {
        let mut table = PredictableTable::new(Some(nz!(100)), BuildHasherDefault::default());

        table.insert_new(5).unwrap();
        assert_eq!(table.remove(&5), Some(5));

        let bucket = table.bucket(5).unwrap();
        assert!(bucket.is_empty());
        assert_eq!(bucket.front(), table.entries().end());
        table.integrity_check();
    }

    #[test]
    fn rehash_is_grow_only() {
        let mut table = HeapSetTable::<u32>::new(Some(nz!(16)), FnvBuildHasher);
        table.insert_new(1).unwrap();

        table.rehash(8).unwrap();
        assert_eq!(table.num_bins(), 16);

        table.rehash(32).unwrap();
        assert_eq!(table.num_bins(), 32);
        assert!(table.find(&1).is_some());
        table.integrity_check();
    }

    #[test]
    fn failed_rehash_leaves_table_usable() {
        let mut table = FixedSetTable::<u32, 20, 10>::new(None, FnvBuildHasher);

        for key in 0..12 {
            table.insert_new(key).unwrap();
        }

        assert_eq!(table.num_bins(), 10);
        assert_eq!(table.rehash(20), Err(Error::CapacityExhausted));
        assert!(table.load_factor() > 0.75);

        for key in 0..12 {
            assert!(table.find(&key).is_some());
        }
        table.integrity_check();
    }

    #[test]
    fn insert_into_full_arena_keeps_bins() {
        // Two of the nine slots go to the list sentinels.
        let mut table = FixedSetTable::<u32, 9, 32>::new(None, FnvBuildHasher);

        let cursors: Vec<_> = (0..7).map(|key| table.insert_new(key).unwrap()).collect();
        assert_eq!(table.num_bins(), 10);

        assert_eq!(table.insert_new(100), Err(Error::CapacityExhausted));

        assert_eq!(table.num_bins(), 10);
        assert_eq!(table.len(), 7);
        for (key, cursor) in (0..7).zip(cursors) {
            assert_eq!(table.get_at(cursor), Some(&key));
        }
        table.integrity_check();
    }

    #[test]
    fn take_fixed_rebuilds_bins() {
        let mut table = FixedSetTable::<u32, 10, 16>::new(None, FnvBuildHasher);

        for key in 0..5 {
            table.insert_new(key).unwrap();
        }

        let moved = table.take();

        assert_eq!(table.len(), 0);
        table.integrity_check();

        assert_eq!(moved.len(), 5);
        for key in 0..5 {
            assert!(moved.find(&key).is_some());
        }
        moved.integrity_check();
    }

    #[test]
    fn take_relocatable_preserves_cursors() {
        let mut table = HeapSetTable::<u32>::new(None, FnvBuildHasher);
        let cursor = table.insert_new(42).unwrap();

        let moved = table.take();

        assert_eq!(moved.get_at(cursor), Some(&42));
        assert_eq!(table.get_at(cursor), None);
        assert_eq!(table.num_bins(), DEFAULT_INITIAL_BINS.get());
    }

    #[test]
    fn clear_keeps_bins() {
        let mut table = HeapSetTable::<u32>::new(None, FnvBuildHasher);

        for key in 0..20 {
            table.insert_new(key).unwrap();
        }
        let bins = table.num_bins();

        table.clear();

        assert_eq!(table.len(), 0);
        assert_eq!(table.num_bins(), bins);
        table.integrity_check();
    }
}
