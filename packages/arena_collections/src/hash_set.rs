use std::any::type_name;
use std::borrow::Borrow;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::iter::FusedIterator;

use crate::hash_table::{HashTable, Identity};
use crate::{
    Allocator, Arena, Bucket, Cursor, Error, FixedAllocator, FixedArena, FnvBuildHasher,
    HashTableBuilder, HeapAllocator, HeapArena, ListIntoIter, ListIter, ListNode, Result,
};

/// A hash set that keeps all of its values in one arena-backed [`List`][crate::List].
///
/// This is the set counterpart of [`HashMap`][crate::HashMap] and shares its bin layout, growth
/// and storage rules. See there for details.
///
/// # Examples
///
/// ```
/// use arena_collections::HeapHashSet;
///
/// let mut set: HeapHashSet<&str> = HeapHashSet::new();
///
/// set.insert("red");
/// set.insert("green");
/// set.insert("red");
///
/// assert_eq!(set.len(), 2);
/// assert!(set.contains("green"));
/// ```
pub struct HashSet<K, A = HeapArena<ListNode<K>>, B = HeapAllocator<Bucket>, S = FnvBuildHasher>
where
    A: Arena<ListNode<K>>,
    B: Allocator<Bucket>,
{
    table: HashTable<K, Identity, A, B, S>,
}

/// A [`HashSet`] that stores its values and bins on the heap.
pub type HeapHashSet<K, S = FnvBuildHasher> =
    HashSet<K, HeapArena<ListNode<K>>, HeapAllocator<Bucket>, S>;

/// A [`HashSet`] that stores its values and bins inline, without any dynamic memory.
///
/// `SLOTS` is the number of list nodes available, two of which are taken by the list sentinels.
/// `BINS` is the largest bin count the set can grow to.
pub type FixedHashSet<K, const SLOTS: usize, const BINS: usize, S = FnvBuildHasher> =
    HashSet<K, FixedArena<ListNode<K>, SLOTS>, FixedAllocator<Bucket, BINS>, S>;

impl<K, A, B, S> HashSet<K, A, B, S>
where
    K: Hash + Eq,
    A: Arena<ListNode<K>> + Default,
    B: Allocator<Bucket> + Default,
    S: BuildHasher + Default,
{
    /// Creates an empty set with the default configuration.
    ///
    /// # Panics
    ///
    /// Panics if the storage cannot hold the list sentinels or a single bin.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts building a set with a custom configuration.
    pub fn builder() -> HashTableBuilder<Self, S> {
        HashTableBuilder::new(S::default())
    }
}

impl<K, A, B, S> HashTableBuilder<HashSet<K, A, B, S>, S>
where
    K: Hash + Eq,
    A: Arena<ListNode<K>> + Default,
    B: Allocator<Bucket> + Default,
    S: BuildHasher,
{
    /// Builds the set with the specified configuration.
    ///
    /// # Panics
    ///
    /// Panics if the storage cannot hold the list sentinels or the initial bins.
    #[must_use]
    pub fn build(self) -> HashSet<K, A, B, S> {
        let (initial_bins, hasher) = self.into_parts();

        HashSet {
            table: HashTable::new(initial_bins, hasher),
        }
    }
}

impl<K, A, B, S> HashSet<K, A, B, S>
where
    K: Hash + Eq,
    A: Arena<ListNode<K>> + Default,
    B: Allocator<Bucket> + Default,
    S: BuildHasher,
{
    /// Creates an empty set that uses the given hasher.
    #[must_use]
    pub fn with_hasher(hasher: S) -> Self {
        HashTableBuilder::<Self, S>::new(hasher).build()
    }

    /// Adds a value unless an equal value is already present.
    ///
    /// Returns a cursor to the stored value (the existing one if there was one), or
    /// [`end()`][Self::end] if the set has no room for a new value.
    pub fn insert(&mut self, value: K) -> Cursor {
        match self.try_insert(value) {
            Ok(cursor) => cursor,
            Err(_) => self.end(),
        }
    }

    /// Adds a value unless an equal value is already present.
    ///
    /// # Errors
    ///
    /// [`Error::CapacityExhausted`] if the value is new and the set has no room for it.
    /// The set is unchanged on error.
    pub fn try_insert(&mut self, value: K) -> Result<Cursor> {
        match self.table.find(&value) {
            Some(cursor) => Ok(cursor),
            None => self.table.insert_new(value),
        }
    }

    /// Grows the set to `bins` bins. Returns `false` if the bucket storage cannot hold that many,
    /// in which case the set is unchanged.
    ///
    /// The set never shrinks; asking for fewer bins than it has does nothing.
    pub fn rehash(&mut self, bins: usize) -> bool {
        self.try_rehash(bins).is_ok()
    }

    /// Grows the set to `bins` bins.
    ///
    /// # Errors
    ///
    /// [`Error::CapacityExhausted`] if the bucket storage cannot hold `bins` bins. The set is
    /// unchanged and remains usable.
    pub fn try_rehash(&mut self, bins: usize) -> Result<()> {
        self.table.rehash(bins)
    }

    /// Moves every value into a new set, leaving this set empty.
    #[must_use]
    pub fn take(&mut self) -> Self
    where
        S: Clone,
    {
        Self {
            table: self.table.take(),
        }
    }
}

impl<K, A, B, S> HashSet<K, A, B, S>
where
    K: Hash + Eq,
    A: Arena<ListNode<K>>,
    B: Allocator<Bucket>,
    S: BuildHasher,
{
    /// The number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the set has no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    /// The current number of bins.
    #[must_use]
    pub fn num_bins(&self) -> usize {
        self.table.num_bins()
    }

    /// The bookkeeping record of bin `bin`, if there is such a bin.
    #[must_use]
    pub fn bucket(&self, bin: usize) -> Option<Bucket> {
        self.table.bucket(bin)
    }

    /// The number of values in bin `bin`. Zero for a bin that does not exist.
    #[must_use]
    pub fn bin_count(&self, bin: usize) -> usize {
        self.table.bucket(bin).map_or(0, |bucket| bucket.count())
    }

    /// The bin that `value` belongs in at the current bin count.
    #[must_use]
    pub fn bin_of<Q>(&self, value: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.bin_of(value)
    }

    /// The number of values per bin.
    #[must_use]
    pub fn load_factor(&self) -> f64 {
        self.table.load_factor()
    }

    /// The hasher used to place values into bins.
    #[must_use]
    pub fn hasher(&self) -> &S {
        self.table.hasher()
    }

    /// A cursor to the first value in iteration order, or [`end()`][Self::end] if empty.
    #[must_use]
    pub fn begin(&self) -> Cursor {
        self.table.entries().begin()
    }

    /// The cursor one past the last value.
    #[must_use]
    pub fn end(&self) -> Cursor {
        self.table.entries().end()
    }

    /// The cursor after `cursor` in iteration order.
    #[must_use]
    pub fn next(&self, cursor: Cursor) -> Cursor {
        self.table.entries().next(cursor)
    }

    /// The value at `cursor`, if it denotes a value of this set.
    #[must_use]
    pub fn get(&self, cursor: Cursor) -> Option<&K> {
        self.table.get_at(cursor)
    }

    /// The cursor of the value equal to `value`, if present.
    #[must_use]
    pub fn find<Q>(&self, value: &Q) -> Option<Cursor>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.find(value)
    }

    /// Whether the set has a value equal to `value`.
    #[must_use]
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.find(value).is_some()
    }

    /// Removes the value at `cursor` and returns a cursor to the value that followed it.
    ///
    /// Does nothing and returns [`end()`][Self::end] if `cursor` is not a value of this set.
    pub fn erase(&mut self, cursor: Cursor) -> Cursor {
        match self.table.remove_at(cursor) {
            Some((_, next)) => next,
            None => self.end(),
        }
    }

    /// Removes the value equal to `value`. Returns whether there was one.
    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.remove(value).is_some()
    }

    /// Removes the value equal to `value` and returns it.
    pub fn extract<Q>(&mut self, value: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.remove(value)
    }

    /// Removes the value equal to `value` and returns it.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the set has no such value.
    pub fn try_extract<Q>(&mut self, value: &Q) -> Result<K>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.extract(value).ok_or(Error::NotFound)
    }

    /// Removes every value. The bin count stays as it is.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Iterates over the values in list order.
    pub fn iter(&self) -> HashSetIter<'_, K, A> {
        HashSetIter {
            inner: self.table.iter(),
        }
    }

    #[cfg(debug_assertions)]
    pub(crate) fn integrity_check(&self) {
        self.table.integrity_check();
    }
}

impl<K, A, B, S> Default for HashSet<K, A, B, S>
where
    K: Hash + Eq,
    A: Arena<ListNode<K>> + Default,
    B: Allocator<Bucket> + Default,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, A, B, S> Clone for HashSet<K, A, B, S>
where
    K: Hash + Eq + Clone,
    A: Arena<ListNode<K>> + Default,
    B: Allocator<Bucket> + Default,
    S: BuildHasher + Clone,
{
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone_table(),
        }
    }
}

impl<K, A, B, S> fmt::Debug for HashSet<K, A, B, S>
where
    K: Hash + Eq + fmt::Debug,
    A: Arena<ListNode<K>>,
    B: Allocator<Bucket>,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K, A, B, S> PartialEq for HashSet<K, A, B, S>
where
    K: Hash + Eq,
    A: Arena<ListNode<K>>,
    B: Allocator<Bucket>,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|value| other.contains(value))
    }
}

impl<K, A, B, S> Eq for HashSet<K, A, B, S>
where
    K: Hash + Eq,
    A: Arena<ListNode<K>>,
    B: Allocator<Bucket>,
    S: BuildHasher,
{
}

impl<K, A, B, S> Extend<K> for HashSet<K, A, B, S>
where
    K: Hash + Eq,
    A: Arena<ListNode<K>> + Default,
    B: Allocator<Bucket> + Default,
    S: BuildHasher,
{
    /// # Panics
    ///
    /// Panics if the set runs out of room for values.
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for value in iter {
            assert!(
                self.try_insert(value).is_ok(),
                "value storage exhausted while extending set of {}",
                type_name::<K>()
            );
        }
    }
}

impl<K, A, B, S> FromIterator<K> for HashSet<K, A, B, S>
where
    K: Hash + Eq,
    A: Arena<ListNode<K>> + Default,
    B: Allocator<Bucket> + Default,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<'a, K, A, B, S> IntoIterator for &'a HashSet<K, A, B, S>
where
    K: Hash + Eq,
    A: Arena<ListNode<K>>,
    B: Allocator<Bucket>,
    S: BuildHasher,
{
    type Item = &'a K;
    type IntoIter = HashSetIter<'a, K, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, A, B, S> IntoIterator for HashSet<K, A, B, S>
where
    K: Hash + Eq,
    A: Arena<ListNode<K>>,
    B: Allocator<Bucket>,
    S: BuildHasher,
{
    type Item = K;
    type IntoIter = ListIntoIter<K, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.table.into_entries().into_iter()
    }
}

/// Iterator over the values of a [`HashSet`], created by [`HashSet::iter()`].
pub struct HashSetIter<'a, K, A: Arena<ListNode<K>>> {
    inner: ListIter<'a, K, A>,
}

impl<'a, K, A: Arena<ListNode<K>>> Iterator for HashSetIter<'a, K, A> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, A: Arena<ListNode<K>>> ExactSizeIterator for HashSetIter<'_, K, A> {}

impl<K, A: Arena<ListNode<K>>> FusedIterator for HashSetIter<'_, K, A> {}

impl<K, A: Arena<ListNode<K>>> fmt::Debug for HashSetIter<'_, K, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashSetIter")
            .field("remaining", &self.inner.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::collections::HashSet as StdHashSet;

    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(HeapHashSet<String>: Send, Sync);
    assert_impl_all!(FixedHashSet<u32, 8, 8>: Send, Sync);

    #[test]
    fn grows_from_ten_to_twenty_bins_on_eighth_value() {
        let mut set: HeapHashSet<u32> = HeapHashSet::new();

        for value in 0..7 {
            set.insert(value);
        }
        assert_eq!(set.num_bins(), 10);

        set.insert(7);
        assert_eq!(set.num_bins(), 20);
        assert!((0..8).all(|value| set.contains(&value)));
        set.integrity_check();
    }

    #[test]
    fn duplicate_insert_is_noop() {
        let mut set: HeapHashSet<u32> = HeapHashSet::new();

        let first = set.insert(5);
        let second = set.insert(5);

        assert_eq!(first, second);
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(first), Some(&5));
    }

    #[test]
    fn insert_then_remove_all_returns_to_empty() {
        let mut set: HeapHashSet<u32> = (0..64).collect();

        for value in 0..64 {
            assert!(set.remove(&value));
        }

        assert!(set.is_empty());
        assert!((0..set.num_bins()).all(|bin| set.bin_count(bin) == 0));
        assert_eq!(set.table.entries().arena().len(), 2);
        set.integrity_check();
    }

    #[test]
    fn extract_returns_stored_value() {
        let mut set: HeapHashSet<String> = HeapHashSet::new();
        set.insert("kiwi".to_string());

        assert_eq!(set.extract("kiwi"), Some("kiwi".to_string()));
        assert_eq!(set.try_extract("kiwi"), Err(Error::NotFound));
        assert!(!set.remove("kiwi"));
    }

    #[test]
    fn erase_through_cursor() {
        let mut set: HeapHashSet<u32> = (0..10).collect();

        let cursor = set.find(&3).unwrap();
        let next = set.erase(cursor);

        assert!(!set.contains(&3));
        assert_eq!(set.len(), 9);
        assert_eq!(set.erase(cursor), set.end());
        if next != set.end() {
            assert!(set.get(next).is_some());
        }
        set.integrity_check();
    }

    #[test]
    fn fixed_set_fills_up_and_recovers() {
        let mut set = FixedHashSet::<u8, 6, 4>::new();

        for value in 0..4 {
            assert_ne!(set.insert(value), set.end());
        }
        assert_eq!(set.try_insert(4), Err(Error::CapacityExhausted));

        // An existing value is still found when full.
        assert!(set.try_insert(0).is_ok());

        assert!(set.remove(&0));
        assert_ne!(set.insert(4), set.end());
        set.integrity_check();
    }

    #[test]
    fn take_fixed_set_moves_values() {
        let mut set: FixedHashSet<u32, 8, 8> = (0..5).collect();

        let moved = set.take();

        assert!(set.is_empty());
        assert_eq!(moved.len(), 5);
        assert!((0..5).all(|value| moved.contains(&value)));
        set.integrity_check();
        moved.integrity_check();
    }

    #[test]
    fn equality_ignores_order() {
        let a: HeapHashSet<u32> = (0..30).collect();
        let b: HeapHashSet<u32> = (0..30).rev().collect();
        let c: HeapHashSet<u32> = (1..31).collect();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.clone(), a);
    }

    #[test]
    fn debug_output_is_a_set() {
        let set: HeapHashSet<u32> = [7].into_iter().collect();

        assert_eq!(format!("{set:?}"), "{7}");
    }

    #[test]
    fn matches_std_set_under_random_operations() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut set: HeapHashSet<u32> = HeapHashSet::new();
        let mut model = StdHashSet::new();

        for _ in 0..5000 {
            let value = rng.random_range(0..300_u32);

            if rng.random_bool(0.5) {
                set.insert(value);
                model.insert(value);
            } else {
                assert_eq!(set.remove(&value), model.remove(&value));
            }

            assert_eq!(set.len(), model.len());
        }

        let mut values: Vec<u32> = set.into_iter().collect();
        let mut expected: Vec<u32> = model.into_iter().collect();
        values.sort_unstable();
        expected.sort_unstable();

        assert_eq!(values, expected);
    }
}
