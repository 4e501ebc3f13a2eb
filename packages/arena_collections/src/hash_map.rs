use std::any::type_name;
use std::borrow::Borrow;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::iter::FusedIterator;
use std::ops::Index;

use crate::hash_table::{FirstOfPair, HashTable};
use crate::{
    Allocator, Arena, Bucket, Cursor, Error, FixedAllocator, FixedArena, FnvBuildHasher,
    HashTableBuilder, HeapAllocator, HeapArena, ListIntoIter, ListIter, ListNode, Result,
};

/// A hash map that keeps all of its entries in one arena-backed [`List`][crate::List].
///
/// The entries of each bin form a contiguous range of the list, described by a [`Bucket`] record
/// kept in a [`Vector`][crate::Vector]. Both the entry arena (`A`) and the bucket storage (`B`)
/// are type parameters, so the same map can live entirely inline or entirely on the heap:
///
/// * [`HeapHashMap`] - unbounded, every entry is an individual heap allocation.
/// * [`FixedHashMap`] - bounded, no dynamic memory. Inserts fail once the entry slots run out and
///   the map stops growing its bin count once the bucket slots run out.
///
/// The map grows by doubling its bin count whenever an insert would take the load factor above
/// 0.75. It never shrinks.
///
/// Positions are expressed as [`Cursor`]s, which stay valid until their entry is removed or the
/// map grows. Inserting a new key may grow the map, so cursors obtained before an insert should
/// be considered stale after it. The cursor returned by the insert itself is always valid.
///
/// # Examples
///
/// ```
/// use arena_collections::FixedHashMap;
///
/// // 8 entry slots (two of which the list reserves for itself) and up to 8 bins.
/// let mut map = FixedHashMap::<u32, &str, 8, 8>::new();
///
/// map.insert(1, "one");
/// map.insert(2, "two");
/// map.insert(1, "uno");
///
/// assert_eq!(map.len(), 2);
/// assert_eq!(map.get(&1), Some(&"uno"));
/// ```
pub struct HashMap<
    K,
    V,
    A = HeapArena<ListNode<(K, V)>>,
    B = HeapAllocator<Bucket>,
    S = FnvBuildHasher,
> where
    A: Arena<ListNode<(K, V)>>,
    B: Allocator<Bucket>,
{
    table: HashTable<(K, V), FirstOfPair, A, B, S>,
}

/// A [`HashMap`] that stores its entries and bins on the heap.
pub type HeapHashMap<K, V, S = FnvBuildHasher> =
    HashMap<K, V, HeapArena<ListNode<(K, V)>>, HeapAllocator<Bucket>, S>;

/// A [`HashMap`] that stores its entries and bins inline, without any dynamic memory.
///
/// `SLOTS` is the number of list nodes available, two of which are taken by the list sentinels.
/// `BINS` is the largest bin count the map can grow to.
pub type FixedHashMap<K, V, const SLOTS: usize, const BINS: usize, S = FnvBuildHasher> =
    HashMap<K, V, FixedArena<ListNode<(K, V)>, SLOTS>, FixedAllocator<Bucket, BINS>, S>;

impl<K, V, A, B, S> HashMap<K, V, A, B, S>
where
    K: Hash + Eq,
    A: Arena<ListNode<(K, V)>> + Default,
    B: Allocator<Bucket> + Default,
    S: BuildHasher + Default,
{
    /// Creates an empty map with the default configuration.
    ///
    /// # Panics
    ///
    /// Panics if the storage cannot hold the list sentinels or a single bin.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts building a map with a custom configuration.
    pub fn builder() -> HashTableBuilder<Self, S> {
        HashTableBuilder::new(S::default())
    }
}

impl<K, V, A, B, S> HashTableBuilder<HashMap<K, V, A, B, S>, S>
where
    K: Hash + Eq,
    A: Arena<ListNode<(K, V)>> + Default,
    B: Allocator<Bucket> + Default,
    S: BuildHasher,
{
    /// Builds the map with the specified configuration.
    ///
    /// # Panics
    ///
    /// Panics if the storage cannot hold the list sentinels or the initial bins.
    #[must_use]
    pub fn build(self) -> HashMap<K, V, A, B, S> {
        let (initial_bins, hasher) = self.into_parts();

        HashMap {
            table: HashTable::new(initial_bins, hasher),
        }
    }
}

impl<K, V, A, B, S> HashMap<K, V, A, B, S>
where
    K: Hash + Eq,
    A: Arena<ListNode<(K, V)>> + Default,
    B: Allocator<Bucket> + Default,
    S: BuildHasher,
{
    /// Creates an empty map that uses the given hasher.
    #[must_use]
    pub fn with_hasher(hasher: S) -> Self {
        HashTableBuilder::<Self, S>::new(hasher).build()
    }

    /// Inserts a key-value pair, replacing the value if the key is already present.
    ///
    /// Returns a cursor to the entry, or [`end()`][Self::end] if the map has no room for a new
    /// entry, in which case the map is unchanged.
    pub fn insert(&mut self, key: K, value: V) -> Cursor {
        match self.try_insert(key, value) {
            Ok(cursor) => cursor,
            Err(_) => self.end(),
        }
    }

    /// Inserts a key-value pair, replacing the value if the key is already present.
    ///
    /// # Errors
    ///
    /// [`Error::CapacityExhausted`] if the key is new and the map has no room for another entry.
    /// The map is unchanged on error.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<Cursor> {
        if let Some(cursor) = self.table.find(&key) {
            let entry = self
                .table
                .get_at_mut(cursor)
                .expect("we just found this entry");
            entry.1 = value;

            return Ok(cursor);
        }

        self.table.insert_new((key, value))
    }

    /// Returns the value for `key`, inserting the result of `f` first if the key is absent.
    ///
    /// Returns `None` if the key is absent and the map has no room for another entry.
    pub fn get_or_insert_with(&mut self, key: K, f: impl FnOnce() -> V) -> Option<&mut V> {
        let cursor = match self.table.find(&key) {
            Some(cursor) => cursor,
            None => self.table.insert_new((key, f())).ok()?,
        };

        self.value_at_mut(cursor)
    }

    /// Returns the value for `key`, inserting the default value first if the key is absent.
    ///
    /// Returns `None` if the key is absent and the map has no room for another entry.
    pub fn get_or_insert_default(&mut self, key: K) -> Option<&mut V>
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    /// Grows the map to at least `bins` bins. Returns `false` if the bucket storage cannot hold
    /// that many, in which case the map is unchanged.
    ///
    /// The map never shrinks; asking for fewer bins than it has does nothing.
    pub fn rehash(&mut self, bins: usize) -> bool {
        self.try_rehash(bins).is_ok()
    }

    /// Grows the map to at least `bins` bins.
    ///
    /// # Errors
    ///
    /// [`Error::CapacityExhausted`] if the bucket storage cannot hold `bins` bins. The map is
    /// unchanged and remains usable.
    pub fn try_rehash(&mut self, bins: usize) -> Result<()> {
        self.table.rehash(bins)
    }

    /// Moves every entry into a new map, leaving this map empty.
    ///
    /// With heap storage, the new map adopts the storage in O(1) and cursors into this map
    /// become cursors into the new map. With fixed storage, every entry moves individually.
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

impl<K, V, A, B, S> HashMap<K, V, A, B, S>
where
    K: Hash + Eq,
    A: Arena<ListNode<(K, V)>>,
    B: Allocator<Bucket>,
    S: BuildHasher,
{
    /// The number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the map has no entries.
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

    /// The number of entries in bin `bin`. Zero for a bin that does not exist.
    #[must_use]
    pub fn bin_count(&self, bin: usize) -> usize {
        self.table.bucket(bin).map_or(0, |bucket| bucket.count())
    }

    /// The bin that `key` belongs in at the current bin count.
    #[must_use]
    pub fn bin_of<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.bin_of(key)
    }

    /// The number of entries per bin.
    #[must_use]
    pub fn load_factor(&self) -> f64 {
        self.table.load_factor()
    }

    /// The hasher used to place keys into bins.
    #[must_use]
    pub fn hasher(&self) -> &S {
        self.table.hasher()
    }

    /// A cursor to the first entry in iteration order, or [`end()`][Self::end] if empty.
    #[must_use]
    pub fn begin(&self) -> Cursor {
        self.table.entries().begin()
    }

    /// The cursor one past the last entry.
    #[must_use]
    pub fn end(&self) -> Cursor {
        self.table.entries().end()
    }

    /// The cursor after `cursor` in iteration order.
    #[must_use]
    pub fn next(&self, cursor: Cursor) -> Cursor {
        self.table.entries().next(cursor)
    }

    /// The cursor of the entry with the given key, if present.
    #[must_use]
    pub fn find<Q>(&self, key: &Q) -> Option<Cursor>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.find(key)
    }

    /// Whether the map has an entry with the given key.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.find(key).is_some()
    }

    /// The value for the given key, if present.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.get(key).map(|(_, value)| value)
    }

    /// The value for the given key for modification, if present.
    #[must_use]
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.get_mut(key).map(|(_, value)| value)
    }

    /// The stored key and the value for the given key, if present.
    #[must_use]
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.get(key).map(|(key, value)| (key, value))
    }

    /// The entry at `cursor`, if it denotes an entry of this map.
    #[must_use]
    pub fn entry_at(&self, cursor: Cursor) -> Option<(&K, &V)> {
        self.table.get_at(cursor).map(|(key, value)| (key, value))
    }

    /// The value of the entry at `cursor` for modification, if it denotes an entry of this map.
    #[must_use]
    pub fn value_at_mut(&mut self, cursor: Cursor) -> Option<&mut V> {
        self.table.get_at_mut(cursor).map(|(_, value)| value)
    }

    /// Removes the entry at `cursor` and returns a cursor to the entry that followed it.
    ///
    /// Does nothing and returns [`end()`][Self::end] if `cursor` is not an entry of this map.
    pub fn erase(&mut self, cursor: Cursor) -> Cursor {
        match self.table.remove_at(cursor) {
            Some((_, next)) => next,
            None => self.end(),
        }
    }

    /// Removes the entry with the given key and returns its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.remove(key).map(|(_, value)| value)
    }

    /// Removes the entry with the given key and returns its value.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the map has no entry with this key.
    pub fn try_remove<Q>(&mut self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove(key).ok_or(Error::NotFound)
    }

    /// Removes every entry. The bin count stays as it is.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Iterates over the entries in list order.
    pub fn iter(&self) -> HashMapIter<'_, K, V, A> {
        HashMapIter {
            inner: self.table.iter(),
        }
    }

    /// Iterates over the keys in list order.
    pub fn keys(&self) -> Keys<'_, K, V, A> {
        Keys {
            inner: self.table.iter(),
        }
    }

    /// Iterates over the values in list order.
    pub fn values(&self) -> Values<'_, K, V, A> {
        Values {
            inner: self.table.iter(),
        }
    }

    #[cfg(debug_assertions)]
    pub(crate) fn integrity_check(&self) {
        self.table.integrity_check();
    }
}

impl<K, V, A, B, S> Default for HashMap<K, V, A, B, S>
where
    K: Hash + Eq,
    A: Arena<ListNode<(K, V)>> + Default,
    B: Allocator<Bucket> + Default,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, A, B, S> Clone for HashMap<K, V, A, B, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    A: Arena<ListNode<(K, V)>> + Default,
    B: Allocator<Bucket> + Default,
    S: BuildHasher + Clone,
{
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone_table(),
        }
    }
}

impl<K, V, A, B, S> fmt::Debug for HashMap<K, V, A, B, S>
where
    K: Hash + Eq + fmt::Debug,
    V: fmt::Debug,
    A: Arena<ListNode<(K, V)>>,
    B: Allocator<Bucket>,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, A, B, S> PartialEq for HashMap<K, V, A, B, S>
where
    K: Hash + Eq,
    V: PartialEq,
    A: Arena<ListNode<(K, V)>>,
    B: Allocator<Bucket>,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K, V, A, B, S> Eq for HashMap<K, V, A, B, S>
where
    K: Hash + Eq,
    V: Eq,
    A: Arena<ListNode<(K, V)>>,
    B: Allocator<Bucket>,
    S: BuildHasher,
{
}

impl<K, Q, V, A, B, S> Index<&Q> for HashMap<K, V, A, B, S>
where
    K: Hash + Eq + Borrow<Q>,
    Q: Hash + Eq + ?Sized,
    A: Arena<ListNode<(K, V)>>,
    B: Allocator<Bucket>,
    S: BuildHasher,
{
    type Output = V;

    fn index(&self, key: &Q) -> &V {
        self.get(key).unwrap_or_else(|| {
            panic!(
                "key not present in map of {} to {}",
                type_name::<K>(),
                type_name::<V>()
            )
        })
    }
}

impl<K, V, A, B, S> Extend<(K, V)> for HashMap<K, V, A, B, S>
where
    K: Hash + Eq,
    A: Arena<ListNode<(K, V)>> + Default,
    B: Allocator<Bucket> + Default,
    S: BuildHasher,
{
    /// # Panics
    ///
    /// Panics if the map runs out of room for entries.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            assert!(
                self.try_insert(key, value).is_ok(),
                "entry storage exhausted while extending map of {} to {}",
                type_name::<K>(),
                type_name::<V>()
            );
        }
    }
}

impl<K, V, A, B, S> FromIterator<(K, V)> for HashMap<K, V, A, B, S>
where
    K: Hash + Eq,
    A: Arena<ListNode<(K, V)>> + Default,
    B: Allocator<Bucket> + Default,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<'a, K, V, A, B, S> IntoIterator for &'a HashMap<K, V, A, B, S>
where
    K: Hash + Eq,
    A: Arena<ListNode<(K, V)>>,
    B: Allocator<Bucket>,
    S: BuildHasher,
{
    type Item = (&'a K, &'a V);
    type IntoIter = HashMapIter<'a, K, V, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, A, B, S> IntoIterator for HashMap<K, V, A, B, S>
where
    K: Hash + Eq,
    A: Arena<ListNode<(K, V)>>,
    B: Allocator<Bucket>,
    S: BuildHasher,
{
    type Item = (K, V);
    type IntoIter = HashMapIntoIter<K, V, A>;

    fn into_iter(self) -> Self::IntoIter {
        HashMapIntoIter {
            inner: self.table.into_entries().into_iter(),
        }
    }
}

/// Iterator over the entries of a [`HashMap`], created by [`HashMap::iter()`].
pub struct HashMapIter<'a, K, V, A: Arena<ListNode<(K, V)>>> {
    inner: ListIter<'a, (K, V), A>,
}

impl<'a, K, V, A: Arena<ListNode<(K, V)>>> Iterator for HashMapIter<'a, K, V, A> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, value)| (key, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, A: Arena<ListNode<(K, V)>>> ExactSizeIterator for HashMapIter<'_, K, V, A> {}

impl<K, V, A: Arena<ListNode<(K, V)>>> FusedIterator for HashMapIter<'_, K, V, A> {}

impl<K, V, A: Arena<ListNode<(K, V)>>> fmt::Debug for HashMapIter<'_, K, V, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashMapIter")
            .field("remaining", &self.inner.len())
            .finish_non_exhaustive()
    }
}

/// Iterator over the keys of a [`HashMap`], created by [`HashMap::keys()`].
pub struct Keys<'a, K, V, A: Arena<ListNode<(K, V)>>> {
    inner: ListIter<'a, (K, V), A>,
}

impl<'a, K, V, A: Arena<ListNode<(K, V)>>> Iterator for Keys<'a, K, V, A> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, A: Arena<ListNode<(K, V)>>> ExactSizeIterator for Keys<'_, K, V, A> {}

impl<K, V, A: Arena<ListNode<(K, V)>>> FusedIterator for Keys<'_, K, V, A> {}

impl<K, V, A: Arena<ListNode<(K, V)>>> fmt::Debug for Keys<'_, K, V, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keys")
            .field("remaining", &self.inner.len())
            .finish_non_exhaustive()
    }
}

/// Iterator over the values of a [`HashMap`], created by [`HashMap::values()`].
pub struct Values<'a, K, V, A: Arena<ListNode<(K, V)>>> {
    inner: ListIter<'a, (K, V), A>,
}

impl<'a, K, V, A: Arena<ListNode<(K, V)>>> Iterator for Values<'a, K, V, A> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, A: Arena<ListNode<(K, V)>>> ExactSizeIterator for Values<'_, K, V, A> {}

impl<K, V, A: Arena<ListNode<(K, V)>>> FusedIterator for Values<'_, K, V, A> {}

impl<K, V, A: Arena<ListNode<(K, V)>>> fmt::Debug for Values<'_, K, V, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Values")
            .field("remaining", &self.inner.len())
            .finish_non_exhaustive()
    }
}

/// Owning iterator over the entries of a [`HashMap`].
pub struct HashMapIntoIter<K, V, A: Arena<ListNode<(K, V)>>> {
    inner: ListIntoIter<(K, V), A>,
}

impl<K, V, A: Arena<ListNode<(K, V)>>> Iterator for HashMapIntoIter<K, V, A> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, A: Arena<ListNode<(K, V)>>> ExactSizeIterator for HashMapIntoIter<K, V, A> {}

impl<K, V, A: Arena<ListNode<(K, V)>>> FusedIterator for HashMapIntoIter<K, V, A> {}

impl<K, V, A: Arena<ListNode<(K, V)>>> fmt::Debug for HashMapIntoIter<K, V, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashMapIntoIter")
            .field("remaining", &self.inner.len())
            .finish_non_exhaustive()
    }
}
