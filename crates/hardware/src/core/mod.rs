//! Hart core implementation.
//!
//! This module contains the hart state machine and everything it owns: the
//! architecture-level state (privilege modes, CSR file), the per-hart lookup
//! caches, and the lifecycle machinery that runs harts on dedicated threads.

/// Architecture-level state (CSRs, privilege modes, interrupt lines).
pub mod arch;

/// Hart state machine, lifecycle, trap and interrupt delivery.
pub mod hart;

/// Per-hart lookup caches (translation cache, compiled-code cache).
pub mod units;

pub use self::hart::{Hart, HartControl, HartHandle, HartRunner};
