//! Execution collaborator contract.
//!
//! The instruction decoder, interpreter loop, and code generator live outside
//! this core. The hart run loop drives them through a single entry point: run
//! guest instructions until something requires the loop's attention.

use crate::core::Hart;

/// The decode/execute/JIT collaborator driven by the hart run loop.
///
/// Implementations run guest instructions in bounded bursts. A burst ends
/// when:
/// - a trap was recorded through [`Hart::trap`],
/// - the implementation's own step budget is exhausted, or
/// - an external restart request flipped the dispatch word.
///
/// # Contract
///
/// Implementations must poll [`Hart::dispatch_running`] at least once per
/// bounded unit of work and return promptly once it reads false: every stop
/// request in the system (pause, preemption, newly pending interrupt, cache
/// invalidation) is advisory and bounded only by the burst granularity.
///
/// When the guest idles waiting for an interrupt, implementations call
/// [`Hart::wait_for_interrupt`] and return after it wakes.
pub trait ExecutionEngine: Send {
    /// Runs instructions until a trap, exhausted step budget, or an external
    /// dispatch-restart request.
    fn run_until_event(&mut self, hart: &mut Hart);
}
