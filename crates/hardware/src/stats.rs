//! Run-loop statistics collection.
//!
//! This module tracks per-hart event counters. It provides:
//! 1. **Loop Activity:** Execution bursts and idle waits.
//! 2. **Trap Traffic:** Synchronous traps taken and interrupts delivered.
//! 3. **Throttling:** Preemption sleeps served.
//!
//! Cache invalidation counts live on the caches themselves.

/// Per-hart event counters.
///
/// Owned by the hart and mutated only on its thread; read them after pausing
/// the hart.
#[derive(Clone, Debug, Default)]
pub struct HartStats {
    /// Execution bursts completed by the run loop.
    pub bursts: u64,
    /// Synchronous traps vectored through CSR state.
    pub traps_taken: u64,
    /// Interrupts delivered to a handler.
    pub irqs_delivered: u64,
    /// Preemption sleeps served.
    pub preempt_sleeps: u64,
    /// Wait-for-interrupt sleeps entered.
    pub wfi_waits: u64,
}

impl HartStats {
    /// Formats a one-line activity summary.
    pub fn summary(&self) -> String {
        format!(
            "bursts={} traps={} irqs={} preempts={} wfi={}",
            self.bursts, self.traps_taken, self.irqs_delivered, self.preempt_sleeps, self.wfi_waits
        )
    }
}
