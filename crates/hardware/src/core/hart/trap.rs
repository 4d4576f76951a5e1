//! Synchronous trap delivery and privilege switching.
//!
//! This module implements the exception side of the trap protocol. It performs
//! the following:
//! 1. **Delegation:** Walks the per-level exception delegation masks downward
//!    from Machine to find the handling privilege level.
//! 2. **Context Saving:** Records EPC/cause/tval and pushes the privilege trap
//!    stack bits in the packed status word.
//! 3. **Privilege Switching:** Recomputes the register width and invalidates
//!    the caches that a level or width change makes stale.

use super::Hart;
use crate::common::Exception;
use crate::common::bits::{bit_check, bit_cut, bit_replace};
use crate::core::arch::csr;
use crate::core::arch::mode::{PrivilegeMode, Xlen};

impl Hart {
    /// Records a synchronous trap.
    ///
    /// In userland single-step mode the trap is deferred: cause and value are
    /// stored at User level and the loop driver surfaces them to its caller
    /// instead of vectoring through CSR state. Otherwise the trap vectors
    /// through the delegation walk, and the new PC takes effect when the run
    /// loop commits it after the current burst unwinds.
    ///
    /// Environment calls keep any in-flight compiled block; every other cause
    /// discards it.
    pub fn trap(&mut self, cause: Exception, tval: u64) {
        self.trap_pending = true;
        if !cause.is_env_call() {
            self.discard_in_flight_block();
        }
        if self.userland {
            self.csr.cause[PrivilegeMode::User.idx()] = cause.code();
            self.csr.tval[PrivilegeMode::User.idx()] = tval;
            self.trap_pc = self.regs.pc();
        } else {
            // Delegate downward while the target level hands this cause off
            // and stays above the level the hart is running at. A trap taken
            // at Machine level therefore never delegates.
            let mut target = PrivilegeMode::Machine;
            while target > self.priv_mode && self.csr.exception_delegated(target, cause.code()) {
                target = target.lower();
            }

            self.csr.epc[target.idx()] = self.regs.pc();
            self.csr.cause[target.idx()] = cause.code();
            self.csr.tval[target.idx()] = tval;
            self.push_trap_stack(target);

            // Exceptions are never vectored: base address, low 2 bits clear.
            self.trap_pc = self.csr.tvec[target.idx()] & !3;
            self.switch_privilege(target);
            self.stats.traps_taken += 1;
            tracing::trace!(
                hartid = self.csr.hartid,
                %cause,
                tval,
                target = %target,
                "trap"
            );
        }
        self.ctl.restart_dispatch();
    }

    /// Saves the privilege trap stack bits in the status word for a trap
    /// entering `target`.
    ///
    /// Current privilege moves into the target's previous-privilege field,
    /// the target's interrupt enable moves into its previous-enable field,
    /// and the enable itself is cleared.
    pub(crate) fn push_trap_stack(&mut self, target: PrivilegeMode) {
        let status = self.csr.status;
        let prior = u64::from(self.priv_mode.to_u8());
        self.csr.status = match target {
            PrivilegeMode::Machine => {
                let s = bit_replace(status, csr::STATUS_MPP, 2, prior);
                let s = bit_replace(s, csr::STATUS_MPIE, 1, bit_cut(s, csr::STATUS_MIE, 1));
                bit_replace(s, csr::STATUS_MIE, 1, 0)
            }
            PrivilegeMode::Hypervisor => {
                let s = bit_replace(status, csr::STATUS_HPP, 2, prior);
                let s = bit_replace(s, csr::STATUS_HPIE, 1, bit_cut(s, csr::STATUS_HIE, 1));
                bit_replace(s, csr::STATUS_HIE, 1, 0)
            }
            PrivilegeMode::Supervisor => {
                let s = bit_replace(status, csr::STATUS_SPP, 1, prior);
                let s = bit_replace(s, csr::STATUS_SPIE, 1, bit_cut(s, csr::STATUS_SIE, 1));
                bit_replace(s, csr::STATUS_SIE, 1, 0)
            }
            PrivilegeMode::User => {
                let s = bit_replace(status, csr::STATUS_UPIE, 1, bit_cut(status, csr::STATUS_UIE, 1));
                bit_replace(s, csr::STATUS_UIE, 1, 0)
            }
        };
    }

    /// Switches the hart to a new privilege level.
    ///
    /// A no-op when the level is unchanged. Otherwise the register width is
    /// recomputed and the translation cache is flushed unconditionally, since the
    /// new level sees a different view of the address space.
    pub fn switch_privilege(&mut self, level: PrivilegeMode) {
        if self.priv_mode != level {
            self.priv_mode = level;
            self.update_xlen();
            self.tlb.flush();
        }
    }

    /// Recomputes the register width from the privilege-specific status bits.
    ///
    /// Machine width is the ISA capability bit; Supervisor and Hypervisor read
    /// the SXL high bit, User the UXL high bit. A width change invalidates the
    /// compiled-code cache and restarts dispatch, since a running compiled
    /// block is invalid under a different width.
    pub fn update_xlen(&mut self) {
        let rv64 = match self.priv_mode {
            PrivilegeMode::Machine => self.csr.isa & csr::ISA_RV64 != 0,
            PrivilegeMode::Hypervisor | PrivilegeMode::Supervisor => {
                bit_check(self.csr.status, csr::STATUS_SXL_64)
            }
            PrivilegeMode::User => bit_check(self.csr.status, csr::STATUS_UXL_64),
        };
        let xlen = if rv64 { Xlen::X64 } else { Xlen::X32 };

        if self.xlen != xlen {
            self.xlen = xlen;
            self.flush_block_cache();
            self.ctl.restart_dispatch();
        }
    }
}
