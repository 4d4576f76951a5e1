//! Configuration system for the hart virtualization engine.
//!
//! This module defines all configuration structures used to parameterize the
//! engine. It provides:
//! 1. **Defaults:** Baseline hardware constants (RAM, caches, timer, hart count).
//! 2. **Structures:** Hierarchical config for the machine and the per-hart engine.
//! 3. **Deserialization:** `Config::default()` for embedders, or JSON via [`Config::from_json`].

use serde::Deserialize;

/// Default configuration constants for the engine.
///
/// These values define the baseline virtual hardware when not explicitly
/// overridden by the embedder.
mod defaults {
    /// Base address of main guest RAM (2 GiB).
    ///
    /// This is the physical address where the guest memory region begins.
    pub const RAM_BASE: u64 = 0x8000_0000;

    /// Total size of main guest RAM (64 MiB).
    pub const RAM_SIZE: u64 = 64 * 1024 * 1024;

    /// Number of harts in the machine.
    pub const HART_COUNT: usize = 1;

    /// Monotonic timer frequency in Hz (10 MHz).
    ///
    /// The timer value is derived from the host clock at this rate; the two
    /// per-hart comparators are expressed in the same ticks.
    pub const TIMER_FREQ_HZ: u64 = 10_000_000;

    /// Translation cache entry count.
    ///
    /// Number of virtual-to-physical page translations cached per hart.
    /// Always a nonzero power of two.
    pub const TLB_SIZE: usize = 256;

    /// Compiled-code cache entry count.
    ///
    /// Number of program-counter-keyed compiled block slots per hart.
    pub const BLOCK_CACHE_SIZE: usize = 256;
}

/// Machine-wide configuration (memory layout, hart count, timer).
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Physical base address of guest RAM.
    pub ram_base: u64,
    /// Size of guest RAM in bytes.
    pub ram_size: u64,
    /// Number of harts to create.
    pub hart_count: usize,
    /// Monotonic timer frequency in Hz.
    pub timer_freq_hz: u64,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            ram_base: defaults::RAM_BASE,
            ram_size: defaults::RAM_SIZE,
            hart_count: defaults::HART_COUNT,
            timer_freq_hz: defaults::TIMER_FREQ_HZ,
        }
    }
}

/// Per-hart configuration (register width, caches, isolation).
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct HartConfig {
    /// Whether harts boot with 64-bit register width capability.
    pub rv64: bool,
    /// Whether the compiled-code fast path is enabled.
    ///
    /// When disabled the harts run interpreter-only and never allocate a
    /// compiled-code cache.
    pub jit: bool,
    /// Translation cache entry count (rounded up to a power of two).
    pub tlb_size: usize,
    /// Compiled-code cache entry count (rounded up to a power of two).
    ///
    /// A value of zero with `jit` enabled falls back to interpreter-only.
    pub block_cache_size: usize,
    /// Whether hart threads restrict themselves via the host isolation hook.
    pub isolation: bool,
}

impl Default for HartConfig {
    fn default() -> Self {
        Self {
            rv64: true,
            jit: true,
            tlb_size: defaults::TLB_SIZE,
            block_cache_size: defaults::BLOCK_CACHE_SIZE,
            isolation: true,
        }
    }
}

/// Root configuration type.
///
/// Use `Config::default()` for the stock machine, or deserialize an embedder
/// supplied JSON document with [`Config::from_json`]. Unknown fields are
/// rejected so configuration typos fail loudly at load time.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Machine-wide settings.
    pub machine: MachineConfig,
    /// Per-hart settings.
    pub hart: HartConfig,
}

impl Config {
    /// Parses a configuration from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error for malformed documents or
    /// unknown fields.
    pub fn from_json(doc: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(doc)
    }
}
