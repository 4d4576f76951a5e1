//! # Compiled-Code Cache Tests
//!
//! Unit tests for the direct-mapped compiled-code cache.

use pretty_assertions::assert_eq;
use rvhart_core::core::units::{BlockCache, BlockId};

#[test]
fn test_new_cache_misses_everything() {
    let cache = BlockCache::new(64);
    assert_eq!(cache.lookup(0x8000_0000), None);
}

#[test]
fn test_insert_then_lookup() {
    let mut cache = BlockCache::new(64);
    cache.insert(0x8000_0000, BlockId(1));
    assert_eq!(cache.lookup(0x8000_0000), Some(BlockId(1)));
}

#[test]
fn test_conflicting_pc_evicts_slot() {
    let mut cache = BlockCache::new(64);
    cache.insert(0x10, BlockId(1));
    cache.insert(0x10 + 64, BlockId(2));

    assert_eq!(cache.lookup(0x10), None);
    assert_eq!(cache.lookup(0x10 + 64), Some(BlockId(2)));
}

#[test]
fn test_reinsert_replaces_block() {
    let mut cache = BlockCache::new(64);
    cache.insert(0x10, BlockId(1));
    cache.insert(0x10, BlockId(9));
    assert_eq!(cache.lookup(0x10), Some(BlockId(9)));
}

#[test]
fn test_flush_invalidates_and_counts() {
    let mut cache = BlockCache::new(64);
    cache.insert(0x10, BlockId(1));
    let flushes = cache.flush_count();

    cache.flush();

    assert_eq!(cache.lookup(0x10), None);
    assert_eq!(cache.flush_count(), flushes + 1);
}

#[test]
fn test_size_rounds_up_to_power_of_two() {
    let mut cache = BlockCache::new(3);
    // Four slots: PCs 0..4 all land in distinct slots.
    cache.insert(0, BlockId(0));
    cache.insert(1, BlockId(1));
    cache.insert(2, BlockId(2));
    cache.insert(3, BlockId(3));
    assert_eq!(cache.lookup(0), Some(BlockId(0)));
    assert_eq!(cache.lookup(3), Some(BlockId(3)));
}
