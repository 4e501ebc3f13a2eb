use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::num::NonZero;

/// Builder for creating an instance of [`HashMap`][crate::HashMap] or
/// [`HashSet`][crate::HashSet].
///
/// You only need to use this builder if you want to customize the table configuration.
/// The default configuration used by `new()` starts with 10 bins (or fewer if the bucket storage
/// cannot hold that many) and a default-constructed hasher.
///
/// The kind of storage is not configured here - it is part of the collection type.
///
/// # Examples
///
/// ```
/// use std::num::NonZero;
///
/// use arena_collections::HeapHashMap;
///
/// let mut map = HeapHashMap::<u32, &str>::builder()
///     .initial_bins(NonZero::new(64).unwrap())
///     .build();
///
/// map.insert(1, "one");
/// assert_eq!(map.num_bins(), 64);
/// ```
#[must_use]
pub struct HashTableBuilder<C, S> {
    initial_bins: Option<NonZero<usize>>,
    hasher: S,

    _collection: PhantomData<fn() -> C>,
}

impl<C, S: fmt::Debug> fmt::Debug for HashTableBuilder<C, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashTableBuilder")
            .field("collection_type", &format_args!("{}", type_name::<C>()))
            .field("initial_bins", &self.initial_bins)
            .field("hasher", &self.hasher)
            .finish()
    }
}

impl<C, S> HashTableBuilder<C, S> {
    pub(crate) fn new(hasher: S) -> Self {
        Self {
            initial_bins: None,
            hasher,
            _collection: PhantomData,
        }
    }

    /// Sets the number of bins the table starts with.
    ///
    /// The table never shrinks below this and grows by doubling whenever an insert would take
    /// it above a load factor of 0.75.
    ///
    /// Building panics if the bucket storage of the collection cannot hold this many bins.
    pub fn initial_bins(mut self, bins: NonZero<usize>) -> Self {
        self.initial_bins = Some(bins);
        self
    }

    /// Sets the hasher used to place keys into bins.
    pub fn hasher(mut self, hasher: S) -> Self {
        self.hasher = hasher;
        self
    }

    pub(crate) fn into_parts(self) -> (Option<NonZero<usize>>, S) {
        (self.initial_bins, self.hasher)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use new_zealand::nz;

    use super::*;
    use crate::{FnvBuildHasher, HeapHashSet};

    #[test]
    fn defaults_leave_bins_unset() {
        let builder = HashTableBuilder::<HeapHashSet<u32>, _>::new(FnvBuildHasher);

        let (bins, _) = builder.into_parts();
        assert_eq!(bins, None);
    }

    #[test]
    fn setters_are_recorded() {
        let builder =
            HashTableBuilder::<HeapHashSet<u32>, _>::new(FnvBuildHasher).initial_bins(nz!(7));

        let (bins, _) = builder.into_parts();
        assert_eq!(bins, Some(nz!(7)));
    }

    #[test]
    fn debug_names_collection() {
        let builder = HashTableBuilder::<HeapHashSet<u32>, _>::new(FnvBuildHasher);

        let output = format!("{builder:?}");
        assert!(output.contains("HashSet"));
        assert!(output.contains("FnvBuildHasher"));
    }
}
