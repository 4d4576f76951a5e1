//! # Translation Cache Tests
//!
//! Unit tests for the direct-mapped translation cache and its per-access-kind
//! tagging.

use pretty_assertions::assert_eq;
use rstest::rstest;
use rvhart_core::common::AccessKind;
use rvhart_core::core::units::TranslationCache;

#[test]
fn test_new_cache_misses_everything() {
    let tlb = TranslationCache::new(64);
    assert_eq!(tlb.lookup(0, AccessKind::Read), None);
    assert_eq!(tlb.lookup(0x8_0000, AccessKind::Execute), None);
}

#[test]
fn test_size_rounds_up_to_power_of_two() {
    let tlb = TranslationCache::new(100);
    assert_eq!(tlb.len(), 128);

    let tlb = TranslationCache::new(0);
    assert_eq!(tlb.len(), 1);
}

#[rstest]
#[case(AccessKind::Read)]
#[case(AccessKind::Write)]
#[case(AccessKind::Execute)]
fn test_insert_then_lookup_same_kind(#[case] kind: AccessKind) {
    let mut tlb = TranslationCache::new(64);
    tlb.insert(0x8_0123, kind, 0x4_5678);
    assert_eq!(tlb.lookup(0x8_0123, kind), Some(0x4_5678));
}

#[test]
fn test_kinds_are_tagged_independently() {
    let mut tlb = TranslationCache::new(64);
    tlb.insert(0x8_0123, AccessKind::Read, 0x4_5678);

    assert_eq!(tlb.lookup(0x8_0123, AccessKind::Read), Some(0x4_5678));
    assert_eq!(tlb.lookup(0x8_0123, AccessKind::Write), None);
    assert_eq!(tlb.lookup(0x8_0123, AccessKind::Execute), None);
}

#[test]
fn test_same_page_accumulates_kinds() {
    let mut tlb = TranslationCache::new(64);
    tlb.insert(0x8_0123, AccessKind::Read, 0x4_5678);
    tlb.insert(0x8_0123, AccessKind::Write, 0x4_5678);

    assert_eq!(tlb.lookup(0x8_0123, AccessKind::Read), Some(0x4_5678));
    assert_eq!(tlb.lookup(0x8_0123, AccessKind::Write), Some(0x4_5678));
}

#[test]
fn test_conflicting_page_evicts_slot() {
    let mut tlb = TranslationCache::new(64);
    // Same slot: page numbers differ by the entry count.
    tlb.insert(0x100, AccessKind::Read, 0xaaa);
    tlb.insert(0x100 + 64, AccessKind::Write, 0xbbb);

    assert_eq!(tlb.lookup(0x100, AccessKind::Read), None);
    assert_eq!(tlb.lookup(0x100 + 64, AccessKind::Write), Some(0xbbb));
}

#[test]
fn test_flush_invalidates_and_counts() {
    let mut tlb = TranslationCache::new(64);
    tlb.insert(0x1, AccessKind::Read, 0x2);
    tlb.insert(0x3, AccessKind::Execute, 0x4);
    let flushes = tlb.flush_count();

    tlb.flush();

    assert_eq!(tlb.lookup(0x1, AccessKind::Read), None);
    assert_eq!(tlb.lookup(0x3, AccessKind::Execute), None);
    assert_eq!(tlb.flush_count(), flushes + 1);
}
