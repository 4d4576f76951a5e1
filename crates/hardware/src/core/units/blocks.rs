//! Compiled-Code Cache.
//!
//! A direct-mapped cache mapping virtual program counters to previously
//! translated executable blocks. The code generator itself is an external
//! collaborator; blocks are opaque handles it hands back when registering a
//! translation. The cache is invalidated wholesale whenever the register
//! width changes, since a block compiled for one width is meaningless under
//! the other.

/// Opaque handle to a compiled block owned by the code generator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockId(pub u64);

/// Tag value meaning "no block cached".
const VACANT: u64 = u64::MAX;

/// A single compiled-code cache entry.
#[derive(Clone, Copy)]
struct BlockEntry {
    /// Virtual PC this entry was compiled at.
    pc: u64,
    /// Handle to the compiled block.
    block: BlockId,
}

impl BlockEntry {
    const fn vacant() -> Self {
        Self {
            pc: VACANT,
            block: BlockId(0),
        }
    }
}

/// Direct-mapped compiled-code cache.
///
/// Present on a hart only when the compiled-code fast path is enabled at
/// construction time; the hart branches on the cache's presence rather than
/// on a compile-time feature.
pub struct BlockCache {
    entries: Box<[BlockEntry]>,
    mask: u64,
    flushes: u64,
}

impl BlockCache {
    /// Creates a new block cache with the specified entry count.
    ///
    /// The count is rounded up to the next power of two; a count of zero gets
    /// a single entry.
    pub fn new(size: usize) -> Self {
        let safe_size = if size.is_power_of_two() {
            size
        } else {
            size.max(1).next_power_of_two()
        };

        Self {
            entries: vec![BlockEntry::vacant(); safe_size].into_boxed_slice(),
            mask: (safe_size - 1) as u64,
            flushes: 0,
        }
    }

    /// Looks up the compiled block for a virtual PC.
    #[inline(always)]
    pub fn lookup(&self, pc: u64) -> Option<BlockId> {
        let entry = &self.entries[(pc & self.mask) as usize];
        if entry.pc == pc { Some(entry.block) } else { None }
    }

    /// Registers a compiled block for a virtual PC, evicting any previous
    /// occupant of the slot.
    pub fn insert(&mut self, pc: u64, block: BlockId) {
        self.entries[(pc & self.mask) as usize] = BlockEntry { pc, block };
    }

    /// Invalidates every entry.
    ///
    /// Called when the register width changes or the code generator's
    /// backing storage is reclaimed.
    pub fn flush(&mut self) {
        for entry in &mut self.entries {
            *entry = BlockEntry::vacant();
        }
        self.flushes += 1;
    }

    /// Returns how many wholesale flushes this cache has seen.
    pub fn flush_count(&self) -> u64 {
        self.flushes
    }
}

impl std::fmt::Debug for BlockCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockCache")
            .field("entries", &self.entries.len())
            .field("flushes", &self.flushes)
            .finish()
    }
}
