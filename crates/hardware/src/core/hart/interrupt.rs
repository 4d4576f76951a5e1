//! Asynchronous interrupt delivery.
//!
//! This module implements the interrupt side of the trap protocol. It performs
//! the following:
//! 1. **Evaluation:** Combines the cross-thread raised lines with the guest's
//!    pending and enable masks.
//! 2. **Delegation:** Walks the per-level interrupt delegation masks downward
//!    from Machine, carrying delegated bits to lower levels.
//! 3. **Delivery:** Vectors exactly one interrupt per invocation (the highest
//!    numbered eligible line) through the privilege trap stack.

use super::Hart;
use crate::core::arch::irq;
use crate::core::arch::mode::PrivilegeMode;

impl Hart {
    /// Returns the interrupt bits that are both pending and enabled.
    ///
    /// Pending state is the union of guest-set pending bits and the lines
    /// raised by other threads through the control block.
    #[inline(always)]
    pub fn interrupts_pending(&self) -> u64 {
        (self.csr.ip | self.ctl.raised_lines()) & self.csr.ie
    }

    /// Evaluates and delivers at most one pending interrupt.
    ///
    /// Run once per loop iteration before resuming execution. Deterministic
    /// and side-effect-free when no eligible interrupt exists, so the loop can
    /// poll it cheaply every iteration.
    pub fn handle_pending_interrupts(&mut self) {
        let mut pending = self.interrupts_pending();
        if pending == 0 {
            return;
        }

        // Walk downward from Machine: bits set in a level's delegation mask
        // are carried to the next lower level, the rest are retained there.
        // Stop at the first level that retains anything, or at User.
        let mut target = PrivilegeMode::Machine;
        let mut retained = pending & !self.csr.interrupt_delegation(target);
        while retained == 0 && target != PrivilegeMode::User {
            pending &= self.csr.interrupt_delegation(target);
            target = target.lower();
            retained = pending & !self.csr.interrupt_delegation(target);
        }

        // A lower-privilege interrupt cannot preempt higher-privilege
        // execution; an equal-privilege one needs that level's global enable.
        if self.priv_mode > target {
            return;
        }
        if self.priv_mode == target && !self.csr.interrupts_enabled_at(target) {
            return;
        }

        // Fixed priority: the highest-numbered retained line wins.
        for line in (0..=irq::LINE_MAX).rev() {
            if retained & (1u64 << line) != 0 {
                self.deliver_interrupt(target, line);
                return;
            }
        }
    }

    /// Vectors one interrupt line into `target`.
    fn deliver_interrupt(&mut self, target: PrivilegeMode, line: u32) {
        self.push_trap_stack(target);
        self.discard_in_flight_block();
        self.switch_privilege(target);

        self.csr.epc[target.idx()] = self.regs.pc();
        // The interrupt-indicator bit position follows the width the target
        // level just switched to.
        self.csr.cause[target.idx()] = u64::from(line) | self.xlen().cause_interrupt_bit();
        self.csr.tval[target.idx()] = 0;

        // Vectored mode offsets the handler by 4 bytes per line number.
        let tvec = self.csr.tvec[target.idx()];
        let base = tvec & !3;
        if tvec & 1 != 0 {
            self.regs.set_pc(base + (u64::from(line) << 2));
        } else {
            self.regs.set_pc(base);
        }

        self.stats.irqs_delivered += 1;
        tracing::trace!(
            hartid = self.csr.hartid,
            line,
            target = %target,
            "interrupt delivered"
        );
    }
}
