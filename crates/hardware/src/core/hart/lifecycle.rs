//! Hart lifecycle: threads, the run loop, and cooperative preemption.
//!
//! Each hart executes on its own dedicated thread. External actors never
//! suspend that thread forcibly; they set advisory flags in the shared
//! control block and the run loop observes them at the top of every burst.
//! This module implements the following:
//! 1. **Run Loop:** The thread body alternating event polling, interrupt
//!    delivery, and bounded execution bursts.
//! 2. **Lifecycle Handle:** Spawn/pause/preempt operations with hart state
//!    ownership threaded through the `JoinHandle`.
//! 3. **Idle Wait:** The wait-for-interrupt sleep with precise timer checks.
//! 4. **Userland Mode:** The single-burst deferred-trap entry point.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::{EVENT_PAUSE, EVENT_PREEMPT, Hart, HartControl};
use crate::core::arch::irq;
use crate::core::arch::mode::PrivilegeMode;
use crate::exec::ExecutionEngine;
use crate::isolation;

/// A hart paired with its execution engine.
///
/// The two are owned side by side so the run loop can hand the hart to the
/// engine without borrow gymnastics or an `Option`-take dance. The whole
/// runner moves into the hart thread on spawn and moves back out through the
/// join when the hart parks.
pub struct HartRunner {
    /// The hart state machine.
    pub hart: Hart,
    /// The decode/execute/JIT collaborator.
    pub engine: Box<dyn ExecutionEngine>,
}

impl HartRunner {
    /// Pairs a hart with its execution engine.
    pub fn new(hart: Hart, engine: Box<dyn ExecutionEngine>) -> Self {
        Self { hart, engine }
    }

    /// The hart thread body.
    ///
    /// Loops until a pause event is observed: mark the hart running, take and
    /// handle queued events, deliver at most one pending interrupt, run a
    /// bounded burst through the engine, then commit any trap the burst
    /// recorded. Returning from this function is the only way a hart thread
    /// exits.
    pub fn run_loop(&mut self) {
        let ctl = Arc::clone(self.hart.control());
        tracing::info!(hartid = self.hart.csr.hartid, "hart started");

        loop {
            // Allow the engine to run; every stop request after this point
            // flips the word back and is observed at the next poll.
            ctl.mark_running();

            let events = ctl.take_events();
            if events != 0 {
                if events & EVENT_PAUSE != 0 {
                    tracing::info!(hartid = self.hart.csr.hartid, "hart stopped");
                    return;
                }
                if events & EVENT_PREEMPT != 0 {
                    let ms = ctl.take_preempt_ms();
                    self.hart.stats.preempt_sleeps += 1;
                    thread::sleep(Duration::from_millis(u64::from(ms)));
                }
            }

            self.hart.handle_pending_interrupts();

            self.engine.run_until_event(&mut self.hart);
            self.hart.stats.bursts += 1;
            self.hart.commit_trap();
        }
    }

    /// Runs exactly one burst in userland single-step mode.
    ///
    /// Traps recorded during the burst are deferred rather than vectored;
    /// this returns the cause code stored at User level so the embedder can
    /// dispatch the system call itself.
    pub fn run_userland(&mut self) -> u64 {
        self.hart.userland = true;
        self.hart.control().mark_running();
        self.engine.run_until_event(&mut self.hart);
        self.hart.stats.bursts += 1;
        self.hart.commit_trap();
        self.hart.csr.cause[PrivilegeMode::User.idx()]
    }
}

impl std::fmt::Debug for HartRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HartRunner")
            .field("hart", &self.hart)
            .finish_non_exhaustive()
    }
}

/// Owner-side handle to one hart.
///
/// Holds the shared control block permanently, and the runner itself whenever
/// the hart is parked. While the hart thread runs, the runner lives inside the
/// `JoinHandle` and the hart's private state is unreachable from here; the
/// pause handshake returns it.
pub struct HartHandle {
    ctl: Arc<HartControl>,
    runner: Option<HartRunner>,
    thread: Option<JoinHandle<HartRunner>>,
    isolate: bool,
}

impl HartHandle {
    /// Wraps a parked runner.
    ///
    /// `isolate` applies the host isolation hook on each spawned thread.
    pub fn new(runner: HartRunner, isolate: bool) -> Self {
        Self {
            ctl: Arc::clone(runner.hart.control()),
            runner: Some(runner),
            thread: None,
            isolate,
        }
    }

    /// Returns the shared control block.
    pub fn control(&self) -> &Arc<HartControl> {
        &self.ctl
    }

    /// Returns whether a hart thread is currently attached.
    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    /// Returns the parked hart, or `None` while its thread runs.
    pub fn hart(&self) -> Option<&Hart> {
        self.runner.as_ref().map(|r| &r.hart)
    }

    /// Returns the parked hart mutably, or `None` while its thread runs.
    pub fn hart_mut(&mut self) -> Option<&mut Hart> {
        self.runner.as_mut().map(|r| &mut r.hart)
    }

    /// Returns the parked runner mutably, or `None` while its thread runs.
    pub fn runner_mut(&mut self) -> Option<&mut HartRunner> {
        self.runner.as_mut()
    }

    /// Starts the hart's dedicated thread.
    ///
    /// Clears queued events first so a stale pause request cannot kill the
    /// fresh thread. A no-op when the hart is already running; callers track
    /// their own lifecycle state.
    pub fn spawn(&mut self) {
        if self.thread.is_some() {
            return;
        }
        let Some(mut runner) = self.runner.take() else {
            return;
        };
        self.ctl.clear_events();
        let isolate = self.isolate;
        self.thread = Some(thread::spawn(move || {
            if isolate {
                isolation::restrict_current_thread();
            }
            runner.run_loop();
            runner
        }));
    }

    /// Queues a pause event and wakes the hart wherever it sleeps.
    ///
    /// Asynchronous: returns before the hart thread has exited.
    pub fn queue_pause(&self) {
        self.ctl.queue_pause();
    }

    /// Pauses the hart and blocks until its thread has fully exited.
    ///
    /// The runner moves back into this handle, making the hart state
    /// reachable again; the join is what orders that hand-back. Taking
    /// `&mut self` serializes concurrent pause attempts by construction.
    pub fn pause(&mut self) {
        self.queue_pause();
        if let Some(thread) = self.thread.take() {
            match thread.join() {
                Ok(runner) => self.runner = Some(runner),
                Err(_) => tracing::warn!("hart thread panicked before parking"),
            }
        }
    }

    /// Requests a bounded sleep of the hart thread; zero is a no-op.
    pub fn preempt(&self, duration_ms: u32) {
        self.ctl.preempt(duration_ms);
    }

    /// Raises an interrupt line on this hart.
    pub fn raise_irq(&self, line: u32) {
        self.ctl.raise_irq(line);
    }

    /// Clears an interrupt line on this hart.
    pub fn clear_irq(&self, line: u32) {
        self.ctl.clear_irq(line);
    }
}

impl std::fmt::Debug for HartHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HartHandle")
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl Hart {
    /// Sleeps until an interrupt, lifecycle event, or timer deadline arrives.
    ///
    /// Called by the execution collaborator when the guest has nothing to do
    /// until an interrupt. The wait wakes on any raised line, on a queued
    /// pause, and on the nearest timer comparator deadline; timer lines are
    /// latched precisely here rather than by the machine's coarse polling,
    /// which skips harts that are parked in this wait.
    pub fn wait_for_interrupt(&mut self) {
        self.stats.wfi_waits += 1;
        let ctl = Arc::clone(&self.ctl);
        ctl.begin_wfi();
        let mut guard = ctl.lock_wfi();
        loop {
            let now = self.timer.now();
            if now >= ctl.mtimecmp.get() {
                let _ = ctl.raise_line_edge(irq::MACHINE_TIMER);
            }
            if now >= ctl.stimecmp.get() {
                let _ = ctl.raise_line_edge(irq::SUPERVISOR_TIMER);
            }
            if ctl.events_pending() || self.interrupts_pending() != 0 {
                break;
            }

            let deadline = ctl.mtimecmp.get().min(ctl.stimecmp.get());
            if deadline == u64::MAX {
                guard = ctl.wait_wfi(guard);
            } else {
                let timeout = self.timer.until(deadline);
                guard = ctl.wait_wfi_timeout(guard, timeout);
            }
        }
        drop(guard);
        ctl.end_wfi();
        // Fall back to the run loop so the woken state is acted on.
        ctl.restart_dispatch();
    }
}
