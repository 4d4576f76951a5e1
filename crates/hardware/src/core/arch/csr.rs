//! Control and Status Register state.
//!
//! This module implements the CSR subsystem for a hart. It provides:
//! 1. **Field Masks:** Bit positions for the packed status word, ISA word, and
//!    per-level interrupt enables.
//! 2. **Register Storage:** The `CsrFile` struct with per-privilege-level arrays.
//! 3. **Delegation Access:** Helpers for the exception/interrupt delegation walk.
//!
//! CSR address encoding and decoding belongs to the instruction collaborator;
//! this module only holds the architectural state the hart core mutates.

use super::mode::{PRIVILEGE_COUNT, PrivilegeMode};
use crate::common::bits::bit_check;

/// User interrupt enable bit position in the status register.
pub const STATUS_UIE: u32 = 0;

/// Supervisor interrupt enable bit position in the status register.
pub const STATUS_SIE: u32 = 1;

/// Hypervisor interrupt enable bit position in the status register.
pub const STATUS_HIE: u32 = 2;

/// Machine interrupt enable bit position in the status register.
pub const STATUS_MIE: u32 = 3;

/// User previous interrupt enable bit position.
pub const STATUS_UPIE: u32 = 4;

/// Supervisor previous interrupt enable bit position.
pub const STATUS_SPIE: u32 = 5;

/// Hypervisor previous interrupt enable bit position.
pub const STATUS_HPIE: u32 = 6;

/// Machine previous interrupt enable bit position.
pub const STATUS_MPIE: u32 = 7;

/// Supervisor previous privilege field position (1 bit).
pub const STATUS_SPP: u32 = 8;

/// Hypervisor previous privilege field position (2 bits).
pub const STATUS_HPP: u32 = 9;

/// Machine previous privilege field position (2 bits).
pub const STATUS_MPP: u32 = 11;

/// User 64-bit width status bit (high bit of the UXL field).
pub const STATUS_UXL_64: u32 = 33;

/// Supervisor 64-bit width status bit (high bit of the SXL field).
pub const STATUS_SXL_64: u32 = 35;

/// ISA word 64-bit capability mask (MXL = 2 in the top two bits).
pub const ISA_RV64: u64 = 2 << 62;

/// ISA word 32-bit capability mask (MXL = 1 in the top two bits).
pub const ISA_RV32: u64 = 1 << 30;

/// Atomic extension bit in the ISA word.
pub const ISA_EXT_A: u64 = 1 << 0;
/// Compressed extension bit in the ISA word.
pub const ISA_EXT_C: u64 = 1 << 2;
/// Double-float extension bit in the ISA word.
pub const ISA_EXT_D: u64 = 1 << 3;
/// Single-float extension bit in the ISA word.
pub const ISA_EXT_F: u64 = 1 << 5;
/// Base integer ISA bit in the ISA word.
pub const ISA_EXT_I: u64 = 1 << 8;
/// Multiply/divide extension bit in the ISA word.
pub const ISA_EXT_M: u64 = 1 << 12;
/// Supervisor mode bit in the ISA word.
pub const ISA_EXT_S: u64 = 1 << 18;
/// User mode bit in the ISA word.
pub const ISA_EXT_U: u64 = 1 << 20;

/// Extension bits advertised by a freshly created hart.
pub const ISA_EXT_DEFAULT: u64 = ISA_EXT_A
    | ISA_EXT_C
    | ISA_EXT_D
    | ISA_EXT_F
    | ISA_EXT_I
    | ISA_EXT_M
    | ISA_EXT_S
    | ISA_EXT_U;

/// Per-hart control and status register state.
///
/// Per-privilege-level registers are arrays indexed by [`PrivilegeMode::idx`].
/// Everything here is owned by the hart's thread; cross-thread interrupt state
/// (raised lines, timer comparators) lives in the hart's shared control block
/// instead, so no field of this struct needs atomic access.
#[derive(Clone, Debug)]
pub struct CsrFile {
    /// Hart identifier.
    pub hartid: u64,
    /// ISA capability word (width capability plus extension bits).
    pub isa: u64,
    /// Packed global status word (interrupt enables, trap stack fields, widths).
    pub status: u64,
    /// Floating-point control and status.
    pub fcsr: u64,

    /// Interrupt enable mask.
    pub ie: u64,
    /// Software-visible interrupt pending mask.
    ///
    /// External interrupt lines raised by other threads are OR-ed in from the
    /// shared control block at evaluation time; this field holds only the bits
    /// the guest sets directly.
    pub ip: u64,

    /// Per-level exception delegation masks.
    ///
    /// A trap taken at Machine level is never delegated: the delegation walk
    /// stops descending at the current privilege, so the masks only matter for
    /// levels above the one the hart runs at.
    pub edeleg: [u64; PRIVILEGE_COUNT],
    /// Per-level interrupt delegation masks.
    pub ideleg: [u64; PRIVILEGE_COUNT],
    /// Per-level trap vector base addresses (low bit selects vectored mode).
    pub tvec: [u64; PRIVILEGE_COUNT],
    /// Per-level scratch registers.
    pub scratch: [u64; PRIVILEGE_COUNT],
    /// Per-level exception program counters.
    pub epc: [u64; PRIVILEGE_COUNT],
    /// Per-level cause registers.
    pub cause: [u64; PRIVILEGE_COUNT],
    /// Per-level trap value registers.
    pub tval: [u64; PRIVILEGE_COUNT],
    /// Per-level counter enable masks.
    pub counteren: [u64; PRIVILEGE_COUNT],
    /// Per-level environment configuration registers.
    pub envcfg: [u64; PRIVILEGE_COUNT],
    /// Machine security configuration register.
    pub mseccfg: u64,
}

impl CsrFile {
    /// Creates the reset-state CSR file for a hart.
    ///
    /// The ISA word advertises the configured width capability plus the
    /// default extension set; everything else resets to zero.
    pub fn new(hartid: u64, rv64: bool) -> Self {
        let width = if rv64 { ISA_RV64 } else { ISA_RV32 };
        Self {
            hartid,
            isa: width | ISA_EXT_DEFAULT,
            status: 0,
            fcsr: 0,
            ie: 0,
            ip: 0,
            edeleg: [0; PRIVILEGE_COUNT],
            ideleg: [0; PRIVILEGE_COUNT],
            tvec: [0; PRIVILEGE_COUNT],
            scratch: [0; PRIVILEGE_COUNT],
            epc: [0; PRIVILEGE_COUNT],
            cause: [0; PRIVILEGE_COUNT],
            tval: [0; PRIVILEGE_COUNT],
            counteren: [0; PRIVILEGE_COUNT],
            envcfg: [0; PRIVILEGE_COUNT],
            mseccfg: 0,
        }
    }

    /// Tests whether `level` delegates exception cause `code` downward.
    #[inline(always)]
    pub fn exception_delegated(&self, level: PrivilegeMode, code: u64) -> bool {
        self.edeleg[level.idx()] & (1 << code) != 0
    }

    /// Returns the interrupt delegation mask for `level`.
    #[inline(always)]
    pub fn interrupt_delegation(&self, level: PrivilegeMode) -> u64 {
        self.ideleg[level.idx()]
    }

    /// Tests the global interrupt-enable status bit for `level`.
    ///
    /// The four enable bits are packed at positions 0..=3 of the status word,
    /// indexed by the privilege level itself.
    #[inline(always)]
    pub fn interrupts_enabled_at(&self, level: PrivilegeMode) -> bool {
        bit_check(self.status, u32::from(level.to_u8()))
    }
}
