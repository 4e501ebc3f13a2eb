#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Containers whose memory comes from pluggable storage providers, so the same container type
//! can run entirely inline (no dynamic memory at all) or on the heap.
//!
//! The crate is built in layers:
//!
//! * **Storage providers**
//!   * [`Allocator`] hands out contiguous blocks of uninitialized slots. [`FixedAllocator`]
//!     keeps its buffer inline, [`HeapAllocator`] uses the global allocator.
//!   * [`Arena`] creates and destroys individual objects addressed by [`Handle`]s. [`FixedArena`]
//!     has a fixed number of inline slots, [`HeapArena`] boxes every object.
//!   * [`AllocationPolicy`] decides how much to over-allocate when a container grows.
//! * **Building blocks**
//!   * [`Vector`] is a growable array on top of an [`Allocator`], with fallible growth.
//!   * [`List`] is a doubly linked list with sentinel nodes, whose nodes live in an [`Arena`].
//! * **Hash tables**
//!   * [`HashMap`] and [`HashSet`] keep all their entries in a single [`List`] in which each bin
//!     owns a contiguous range, tracked by a [`Bucket`] record in a [`Vector`].
//!
//! Every provider declares whether its storage is *relocatable*, meaning ownership of the storage
//! can be handed to another container without touching the objects in it. Containers use this to
//! pick their move strategy: adopting the storage in O(1), or moving elements one by one into
//! storage of their own.
//!
//! # Failure handling
//!
//! Running out of storage is an expected condition, not a bug. Operations report it through their
//! return value (`None`, `false` or an end [`Cursor`]) and leave the container unchanged. The
//! `try_` variants of these operations report the same conditions as an [`Error`] instead.
//!
//! # Examples
//!
//! ```
//! use arena_collections::{FixedHashMap, HeapHashMap};
//!
//! // Lives entirely inline: room for 14 entries (16 slots minus two list sentinels) and 16 bins.
//! let mut inline = FixedHashMap::<u32, u32, 16, 16>::new();
//!
//! for key in 0..14 {
//!     inline.insert(key, key * key);
//! }
//!
//! // The entry storage is full, so a new key is rejected and the map is unchanged.
//! assert!(inline.try_insert(100, 0).is_err());
//! assert_eq!(inline.len(), 14);
//!
//! // The heap variant has the same API but no fixed limit.
//! let mut heap: HeapHashMap<u32, u32> = inline.iter().map(|(k, v)| (*k, *v)).collect();
//! heap.insert(100, 0);
//!
//! assert_eq!(heap.len(), 15);
//! assert_eq!(heap.get(&3), Some(&9));
//! ```

mod allocator;
mod arena;
mod builder;
mod error;
mod fixed_allocator;
mod fixed_arena;
mod handle;
mod hash;
mod hash_map;
mod hash_set;
mod hash_table;
mod heap_allocator;
mod heap_arena;
mod list;
mod policy;
mod vector;

pub use allocator::*;
pub use arena::*;
pub use builder::*;
pub use error::*;
pub use fixed_allocator::*;
pub use fixed_arena::*;
pub use handle::*;
pub use hash::*;
pub use hash_map::*;
pub use hash_set::*;
pub use hash_table::Bucket;
pub use heap_allocator::*;
pub use heap_arena::*;
pub use list::*;
pub use policy::*;
pub use vector::*;
