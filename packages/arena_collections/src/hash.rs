use std::hash::{BuildHasher, Hasher};

#[cfg(target_pointer_width = "64")]
const OFFSET_BASIS: usize = 0xcbf2_9ce4_8422_2325;
#[cfg(target_pointer_width = "64")]
const PRIME: usize = 0x0000_0100_0000_01b3;

#[cfg(not(target_pointer_width = "64"))]
const OFFSET_BASIS: usize = 0x811c_9dc5;
#[cfg(not(target_pointer_width = "64"))]
const PRIME: usize = 0x0100_0193;

/// FNV-1a over the bytes a key feeds into [`Hasher::write()`], in a word-sized accumulator.
///
/// This is the default hasher of the hash maps and sets in this crate. It is fast for short keys
/// and fully deterministic, which makes bucket placement reproducible across runs. It offers no
/// protection against adversarially chosen keys.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FnvHasher {
    state: usize,
}

impl FnvHasher {
    /// Creates a hasher in its initial state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: OFFSET_BASIS,
        }
    }
}

impl Default for FnvHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for FnvHasher {
    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.state ^= usize::from(*byte);
            self.state = self.state.wrapping_mul(PRIME);
        }
    }

    fn finish(&self) -> u64 {
        self.state as u64
    }
}

/// Creates [`FnvHasher`] instances for hash maps and sets.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FnvBuildHasher;

impl BuildHasher for FnvBuildHasher {
    type Hasher = FnvHasher;

    fn build_hasher(&self) -> FnvHasher {
        FnvHasher::new()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(FnvBuildHasher: Send, Sync, Copy);

    fn fnv(bytes: &[u8]) -> u64 {
        let mut hasher = FnvHasher::new();
        hasher.write(bytes);
        hasher.finish()
    }

    #[test]
    fn empty_input_is_offset_basis() {
        assert_eq!(fnv(&[]), OFFSET_BASIS as u64);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn known_vectors() {
        assert_eq!(fnv(b"a"), 0xaf63_dc4c_8601_ec8c);
        assert_eq!(fnv(b"foobar"), 0x8594_4171_f739_67e8);
    }

    #[test]
    fn deterministic_across_instances() {
        let builder = FnvBuildHasher;

        assert_eq!(builder.hash_one("key"), FnvBuildHasher.hash_one("key"));
        assert_ne!(builder.hash_one("key"), builder.hash_one("kez"));
    }

    #[test]
    fn write_is_incremental() {
        let mut split = FnvHasher::new();
        split.write(b"foo");
        split.write(b"bar");

        assert_eq!(split.finish(), fnv(b"foobar"));
    }
}
