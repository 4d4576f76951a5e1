//! Hart state machine and shared control block.
//!
//! This module defines the central `Hart` structure and the concurrency
//! control state other threads use to steer it. It coordinates the following:
//! 1. **State Ownership:** Registers, CSR file, and caches are owned by the
//!    hart's thread; nothing else may touch them while the hart runs.
//! 2. **Cross-Thread Control:** A shared atomic control block carries pause,
//!    preemption, and interrupt requests into the run loop's poll points.
//! 3. **Execution Modes:** The full privileged state machine and the degenerate
//!    userland single-step mode are the same type, distinguished by a flag.

mod interrupt;
mod lifecycle;
mod trap;

pub use lifecycle::{HartHandle, HartRunner};

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use crate::common::addr::PAGE_SHIFT;
use crate::common::{AccessKind, PhysAddr, RegisterFile, VirtAddr};
use crate::config::Config;
use crate::core::arch::csr::CsrFile;
use crate::core::arch::irq;
use crate::core::arch::mode::{PrivilegeMode, Xlen};
use crate::core::units::{BlockCache, TranslationCache};
use crate::machine::ram::Ram;
use crate::machine::timer::{TimeComparator, Timer};
use crate::stats::HartStats;

/// Dispatch word value while the hart is parked or asked to yield.
const DISPATCH_STOPPED: u32 = 0;

/// Dispatch word value while the hart is free to execute guest code.
const DISPATCH_RUNNING: u32 = 1;

/// Pending-event bit: park the hart thread in a consistent state.
pub const EVENT_PAUSE: u32 = 0x1;

/// Pending-event bit: sleep the hart thread for the stored duration.
pub const EVENT_PREEMPT: u32 = 0x2;

/// Cross-thread control state for one hart.
///
/// Everything here is mutated with atomic operations (or under the small WFI
/// mutex) and may be touched from any thread: device emulation raising
/// interrupt lines, a supervisor thread pausing the machine, or the hart's
/// own thread polling at burst boundaries. Relaxed ordering is sufficient
/// throughout: these are advisory flags whose observers tolerate eventual
/// visibility, and the pause handshake gets its synchronization from the
/// thread join instead.
#[derive(Debug)]
pub struct HartControl {
    /// Run-state word observed by the execution collaborator.
    dispatch: AtomicU32,
    /// Pending lifecycle events (`EVENT_PAUSE`, `EVENT_PREEMPT`).
    events: AtomicU32,
    /// Raised interrupt lines, one bit per line.
    lines: AtomicU64,
    /// Preemption sleep duration in milliseconds.
    preempt_ms: AtomicU32,

    /// Machine-level timer comparator.
    pub mtimecmp: TimeComparator,
    /// Supervisor-level timer comparator.
    pub stimecmp: TimeComparator,

    /// Lock pairing with `wfi_cond`; holds no data, the predicate is atomic.
    wfi_lock: Mutex<()>,
    /// Wakes a hart sleeping in wait-for-interrupt.
    wfi_cond: Condvar,
    /// Number of threads currently blocked in the WFI wait.
    wfi_waiters: AtomicU32,
}

impl HartControl {
    /// Creates a control block in the stopped state with nothing pending.
    pub fn new() -> Self {
        Self {
            dispatch: AtomicU32::new(DISPATCH_STOPPED),
            events: AtomicU32::new(0),
            lines: AtomicU64::new(0),
            preempt_ms: AtomicU32::new(0),
            mtimecmp: TimeComparator::new(),
            stimecmp: TimeComparator::new(),
            wfi_lock: Mutex::new(()),
            wfi_cond: Condvar::new(),
            wfi_waiters: AtomicU32::new(0),
        }
    }

    /// Forces the dispatch word to stopped.
    ///
    /// This is a cooperative "yield now and re-evaluate" signal: the execution
    /// collaborator observes it at its next poll point and returns control to
    /// the run loop, which immediately marks the hart running again. It does
    /// not park the hart; that is what the pause event is for.
    #[inline(always)]
    pub fn restart_dispatch(&self) {
        self.dispatch.store(DISPATCH_STOPPED, Ordering::Relaxed);
    }

    /// Marks the hart free to execute guest code.
    pub(crate) fn mark_running(&self) {
        self.dispatch.store(DISPATCH_RUNNING, Ordering::Relaxed);
    }

    /// Returns whether the execution collaborator may keep running.
    ///
    /// Polled by the collaborator at every burst boundary.
    #[inline(always)]
    pub fn dispatch_running(&self) -> bool {
        self.dispatch.load(Ordering::Relaxed) == DISPATCH_RUNNING
    }

    /// Atomically takes and clears the pending-event mask.
    pub(crate) fn take_events(&self) -> u32 {
        self.events.swap(0, Ordering::Relaxed)
    }

    /// Returns whether any lifecycle event is queued.
    pub fn events_pending(&self) -> bool {
        self.events.load(Ordering::Relaxed) != 0
    }

    /// Clears queued events; called once before a hart thread starts.
    pub(crate) fn clear_events(&self) {
        self.events.store(0, Ordering::Relaxed);
    }

    /// Queues a pause event and wakes the hart wherever it sleeps.
    ///
    /// Asynchronous: returns before the hart thread has actually parked.
    pub fn queue_pause(&self) {
        let _ = self.events.fetch_or(EVENT_PAUSE, Ordering::Relaxed);
        self.kick();
    }

    /// Requests a bounded sleep of the hart thread to throttle its execution
    /// rate. A zero duration is a no-op.
    pub fn preempt(&self, duration_ms: u32) {
        if duration_ms != 0 {
            self.preempt_ms.store(duration_ms, Ordering::Relaxed);
            let _ = self.events.fetch_or(EVENT_PREEMPT, Ordering::Relaxed);
            self.restart_dispatch();
        }
    }

    /// Atomically takes and clears the preemption duration.
    pub(crate) fn take_preempt_ms(&self) -> u32 {
        self.preempt_ms.swap(0, Ordering::Relaxed)
    }

    /// Raises an interrupt line from any thread.
    ///
    /// Out-of-range lines are ignored. The hart is only kicked on a 0-to-1
    /// edge, so re-raising an already pending line stays cheap for devices
    /// that signal level-triggered interrupts repeatedly.
    pub fn raise_irq(&self, line: u32) {
        if line >= irq::LINE_COUNT {
            return;
        }
        if self.raise_line_edge(line) {
            self.kick();
        }
    }

    /// Clears a raised interrupt line from any thread.
    ///
    /// Out-of-range lines are ignored.
    pub fn clear_irq(&self, line: u32) {
        if line >= irq::LINE_COUNT {
            return;
        }
        let _ = self.lines.fetch_and(!(1u64 << line), Ordering::Relaxed);
    }

    /// Returns the currently raised interrupt lines.
    #[inline(always)]
    pub fn raised_lines(&self) -> u64 {
        self.lines.load(Ordering::Relaxed)
    }

    /// Restarts dispatch if any raised line intersects `enabled`.
    ///
    /// Used when enable state changes behind a hart that already polled.
    pub fn kick_if_pending(&self, enabled: u64) {
        if self.raised_lines() & enabled != 0 {
            self.restart_dispatch();
        }
    }

    /// Latches timer interrupt lines for any comparator at or past `now` and
    /// restarts dispatch when a line newly fires.
    ///
    /// Skipped entirely while a thread is blocked in the WFI wait: the wait
    /// performs its own precise deadline check on wake, and doing it here too
    /// would just duplicate the work.
    pub fn check_timer(&self, timer: &Timer) {
        if self.wfi_waiters.load(Ordering::Relaxed) != 0 {
            return;
        }
        let now = timer.now();
        if now >= self.mtimecmp.get() && self.raise_line_edge(irq::MACHINE_TIMER) {
            self.restart_dispatch();
        }
        if now >= self.stimecmp.get() && self.raise_line_edge(irq::SUPERVISOR_TIMER) {
            self.restart_dispatch();
        }
    }

    /// Sets one interrupt line bit, returning true if it was newly set.
    pub(crate) fn raise_line_edge(&self, line: u32) -> bool {
        let mask = 1u64 << line;
        self.lines.fetch_or(mask, Ordering::Relaxed) & mask == 0
    }

    /// Restart dispatch and wake any WFI sleeper.
    fn kick(&self) {
        self.restart_dispatch();
        // Taking the lock orders the wake against a sleeper that has checked
        // its predicate but not yet blocked.
        let guard = self.lock_wfi();
        drop(guard);
        self.wfi_cond.notify_all();
    }

    pub(crate) fn begin_wfi(&self) {
        let _ = self.wfi_waiters.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn end_wfi(&self) {
        let _ = self.wfi_waiters.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn lock_wfi(&self) -> MutexGuard<'_, ()> {
        self.wfi_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn wait_wfi<'a>(&self, guard: MutexGuard<'a, ()>) -> MutexGuard<'a, ()> {
        self.wfi_cond
            .wait(guard)
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn wait_wfi_timeout<'a>(
        &self,
        guard: MutexGuard<'a, ()>,
        timeout: std::time::Duration,
    ) -> MutexGuard<'a, ()> {
        match self.wfi_cond.wait_timeout(guard, timeout) {
            Ok((guard, _)) => guard,
            Err(poisoned) => poisoned.into_inner().0,
        }
    }
}

impl Default for HartControl {
    fn default() -> Self {
        Self::new()
    }
}

/// One virtual CPU execution context.
///
/// A hart owns its register file, CSR state, translation cache, and optional
/// compiled-code cache outright; while its thread runs, that state is moved
/// into the thread and is unreachable from outside. Cross-thread interaction
/// goes exclusively through the shared [`HartControl`] block.
pub struct Hart {
    /// Integer registers, PC slot, and floating-point registers.
    pub regs: RegisterFile,
    /// Control and status register state.
    pub csr: CsrFile,
    /// Address translation cache.
    pub tlb: TranslationCache,
    /// Run-loop and delivery counters.
    pub stats: HartStats,
    /// Load-reservation address for the atomics collaborator.
    pub reservation: Option<u64>,

    priv_mode: PrivilegeMode,
    xlen: Xlen,
    trap_pending: bool,
    trap_pc: u64,
    userland: bool,

    blocks: Option<BlockCache>,
    block_in_flight: bool,

    ctl: Arc<HartControl>,
    mem: Arc<Ram>,
    timer: Arc<Timer>,
}

impl Hart {
    /// Creates a hart wired to its machine's memory and timer.
    ///
    /// The hart starts at Machine privilege with the translation cache empty
    /// and no thread attached; call [`Hart::prepare`] before first spawn to
    /// set up the optional compiled-code cache.
    pub fn new(mem: Arc<Ram>, timer: Arc<Timer>, hartid: u64, config: &Config) -> Self {
        let rv64 = config.hart.rv64;
        Self {
            regs: RegisterFile::new(),
            csr: CsrFile::new(hartid, rv64),
            tlb: TranslationCache::new(config.hart.tlb_size),
            stats: HartStats::default(),
            reservation: None,
            priv_mode: PrivilegeMode::Machine,
            xlen: if rv64 { Xlen::X64 } else { Xlen::X32 },
            trap_pending: false,
            trap_pc: 0,
            userland: false,
            blocks: None,
            block_in_flight: false,
            ctl: Arc::new(HartControl::new()),
            mem,
            timer,
        }
    }

    /// Lazily sets up the compiled-code fast path per configuration.
    ///
    /// With a zero cache capacity the fast path cannot work; the hart logs a
    /// warning and falls back to interpreter-only rather than failing.
    pub fn prepare(&mut self, config: &Config) {
        if !config.hart.jit || self.blocks.is_some() {
            return;
        }
        if config.hart.block_cache_size == 0 {
            tracing::warn!(
                hartid = self.csr.hartid,
                "compiled-code cache unavailable, falling back to interpreter"
            );
            return;
        }
        self.blocks = Some(BlockCache::new(config.hart.block_cache_size));
    }

    /// Returns the shared control block.
    #[inline(always)]
    pub fn control(&self) -> &Arc<HartControl> {
        &self.ctl
    }

    /// Returns the current privilege level.
    #[inline(always)]
    pub fn privilege(&self) -> PrivilegeMode {
        self.priv_mode
    }

    /// Returns the current register width mode.
    #[inline(always)]
    pub fn xlen(&self) -> Xlen {
        self.xlen
    }

    /// Returns the machine memory this hart is wired to.
    pub fn mem(&self) -> &Arc<Ram> {
        &self.mem
    }

    /// Returns the machine timer this hart is wired to.
    pub fn timer(&self) -> &Arc<Timer> {
        &self.timer
    }

    /// Returns whether the hart runs in userland single-step mode.
    #[inline(always)]
    pub fn userland(&self) -> bool {
        self.userland
    }

    /// Shorthand for [`HartControl::dispatch_running`] for the execution
    /// collaborator's poll points.
    #[inline(always)]
    pub fn dispatch_running(&self) -> bool {
        self.ctl.dispatch_running()
    }

    /// Returns the recorded trap target PC while a trap is pending.
    pub fn pending_trap(&self) -> Option<u64> {
        if self.trap_pending {
            Some(self.trap_pc)
        } else {
            None
        }
    }

    /// Moves the PC to the recorded trap target and clears the pending flag.
    ///
    /// Called by the run loop after each burst.
    pub(crate) fn commit_trap(&mut self) {
        if self.trap_pending {
            self.regs.set_pc(self.trap_pc);
            self.trap_pending = false;
        }
    }

    /// Returns whether the compiled-code fast path is available.
    pub fn jit_enabled(&self) -> bool {
        self.blocks.is_some()
    }

    /// Returns the compiled-code cache, when present.
    pub fn block_cache(&self) -> Option<&BlockCache> {
        self.blocks.as_ref()
    }

    /// Returns the compiled-code cache mutably, when present.
    pub fn block_cache_mut(&mut self) -> Option<&mut BlockCache> {
        self.blocks.as_mut()
    }

    /// Marks a compiled block as in flight; set by the code generator while
    /// it translates.
    pub fn begin_block(&mut self) {
        self.block_in_flight = true;
    }

    /// Returns whether a compiled block is currently in flight.
    pub fn block_in_flight(&self) -> bool {
        self.block_in_flight
    }

    /// Discards any in-flight compiled block.
    ///
    /// Invoked on every trap whose continuation point is not cacheable.
    pub fn discard_in_flight_block(&mut self) {
        self.block_in_flight = false;
    }

    /// Invalidates the whole compiled-code cache and discards any in-flight
    /// block.
    pub fn flush_block_cache(&mut self) {
        self.block_in_flight = false;
        if let Some(blocks) = self.blocks.as_mut() {
            blocks.flush();
        }
    }

    /// Drops the load reservation; for the atomics collaborator.
    pub fn drop_reservation(&mut self) {
        self.reservation = None;
    }

    /// Resolves a virtual address through the translation cache.
    ///
    /// Returns `None` on a miss, in which case the memory collaborator walks
    /// the page tables and inserts the result for the access kind it proved.
    pub fn translate_cached(&self, addr: VirtAddr, kind: AccessKind) -> Option<PhysAddr> {
        let page = self.tlb.lookup(addr.page_number(), kind)?;
        Some(PhysAddr::new((page << PAGE_SHIFT) | addr.page_offset()))
    }
}

impl std::fmt::Debug for Hart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hart")
            .field("hartid", &self.csr.hartid)
            .field("privilege", &self.priv_mode)
            .field("xlen", &self.xlen)
            .field("pc", &self.regs.pc())
            .field("userland", &self.userland)
            .finish_non_exhaustive()
    }
}
