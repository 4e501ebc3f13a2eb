//! Tour of the `arena_collections` crate:
//!
//! * A map that lives entirely inline and rejects inserts once full.
//! * Walking and erasing entries through cursors.
//! * Moving a map with relocatable storage, which keeps cursors valid.

use arena_collections::{FixedHashMap, HeapHashMap, HeapList};

fn main() {
    // 10 node slots (two go to the list sentinels) and up to 16 bins, no dynamic memory.
    let mut inventory = FixedHashMap::<&str, u32, 10, 16>::new();

    for (item, count) in [
        ("apples", 3),
        ("pears", 0),
        ("plums", 7),
        ("kiwis", 0),
        ("figs", 2),
    ] {
        inventory.insert(item, count);
    }

    println!(
        "Inventory has {} items in {} bins (load factor {:.2})",
        inventory.len(),
        inventory.num_bins(),
        inventory.load_factor()
    );

    // Erasing through a cursor hands back the cursor of the next entry.
    let mut cursor = inventory.begin();
    while cursor != inventory.end() {
        let (_, count) = inventory
            .entry_at(cursor)
            .expect("cursors between begin and end denote entries");

        cursor = if *count == 0 {
            inventory.erase(cursor)
        } else {
            inventory.next(cursor)
        };
    }

    println!("In stock: {inventory:?}");

    // Filling up the remaining slots and then some.
    for extra in ["a", "b", "c", "d", "e", "f"] {
        if let Err(error) = inventory.try_insert(extra, 1) {
            println!("Could not add {extra}: {error}");
        }
    }

    // Heap storage is relocatable: moving the map keeps cursors pointing at the same entries.
    let mut prices: HeapHashMap<&str, f64> = HeapHashMap::new();
    let apples = prices.insert("apples", 0.5);
    prices.insert("plums", 1.25);

    let moved = prices.take();
    println!(
        "After the move the old map has {} entries and the apples cursor still finds {:?}",
        prices.len(),
        moved.entry_at(apples)
    );

    // The list the maps are built on is usable on its own too.
    let mut queue: HeapList<&str> = HeapList::new();
    queue.push_back("second");
    queue.push_front("first");
    queue.push_back("third");

    let joined = queue.iter().copied().collect::<Vec<_>>().join(", ");
    println!("Queue: {joined}");
}
