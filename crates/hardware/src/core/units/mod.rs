//! Per-hart lookup structures.
//!
//! This module contains the two fixed-size caches owned by every hart: the
//! address translation cache and the optional compiled-code cache. Both are
//! pure lookup accelerators; the algorithms that fill them (page-table walk,
//! code generation) live in external collaborators, and this core is only
//! responsible for invalidating them at the architecturally required points.

/// Compiled-code cache keyed by virtual program counter.
pub mod blocks;

/// Address translation cache keyed by virtual page number.
pub mod tlb;

pub use blocks::{BlockCache, BlockId};
pub use tlb::TranslationCache;
