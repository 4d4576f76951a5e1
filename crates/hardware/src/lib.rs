//! Multi-threaded RISC-V hart virtualization engine.
//!
//! This crate implements the execution and concurrency control core of a
//! machine-level CPU virtualizer with the following:
//! 1. **Hart:** Per-CPU state machine (registers, CSRs, privilege levels) with
//!    trap delegation and interrupt delivery.
//! 2. **Concurrency:** One thread per hart with cooperative pause, preemption,
//!    and wait-for-interrupt idling driven by shared atomic control state.
//! 3. **Caches:** Address translation and compiled-code caches with the
//!    architecturally required invalidation triggers.
//! 4. **Machine:** Guest RAM, the monotonic timer, and hart composition.
//! 5. **Collaborators:** The decode/execute/JIT engine is consumed through a
//!    single run-until-event contract, never implemented here.

/// Common types (addresses, bit helpers, registers, errors).
pub mod common;
/// Engine configuration (defaults, machine and hart sections).
pub mod config;
/// Hart core (state machine, lifecycle, traps, interrupts, caches).
pub mod core;
/// Execution collaborator contract.
pub mod exec;
/// Host thread isolation hook.
pub mod isolation;
/// The machine: guest RAM, timer, and hart collection.
pub mod machine;
/// Per-hart event counters.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Central hart state machine type.
pub use crate::core::Hart;
/// Execution collaborator entry point.
pub use crate::exec::ExecutionEngine;
/// Top-level virtual system; construct with `Machine::new`.
pub use crate::machine::Machine;
