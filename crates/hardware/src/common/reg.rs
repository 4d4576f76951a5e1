//! Unified Register File.
//!
//! This module provides the `RegisterFile` struct holding the general-purpose
//! registers, the dedicated program-counter slot, and the floating-point
//! registers. It provides:
//! 1. **Storage:** 32 integer registers plus the PC slot, and 32 FP registers.
//! 2. **Invariant Enforcement:** Register `x0` is hardwired to zero.
//! 3. **Observability:** Debugging utilities for dumping register state.

/// Index of the hardwired zero register.
pub const REG_ZERO: usize = 0;

/// Index of the dedicated program-counter slot.
///
/// Keeping the PC in the same indexable file as `x1`-`x31` lets the execution
/// collaborator address it uniformly with the architectural registers.
pub const REG_PC: usize = 32;

/// Number of integer register slots including the PC.
pub const REG_COUNT: usize = 33;

/// Number of floating-point registers.
pub const FP_REG_COUNT: usize = 32;

/// Unified register file containing integer, PC, and floating-point state.
#[derive(Clone, Debug)]
pub struct RegisterFile {
    x: [u64; REG_COUNT],
    f: [u64; FP_REG_COUNT],
}

impl RegisterFile {
    /// Creates a new register file with all registers initialized to zero.
    pub fn new() -> Self {
        Self {
            x: [0; REG_COUNT],
            f: [0; FP_REG_COUNT],
        }
    }

    /// Reads an integer register or the PC slot.
    ///
    /// Register `x0` always returns 0.
    #[inline(always)]
    pub fn read(&self, idx: usize) -> u64 {
        if idx == REG_ZERO { 0 } else { self.x[idx] }
    }

    /// Writes an integer register or the PC slot.
    ///
    /// Writes to `x0` are ignored.
    #[inline(always)]
    pub fn write(&mut self, idx: usize, val: u64) {
        if idx != REG_ZERO {
            self.x[idx] = val;
        }
    }

    /// Reads the program counter.
    #[inline(always)]
    pub fn pc(&self) -> u64 {
        self.x[REG_PC]
    }

    /// Writes the program counter.
    #[inline(always)]
    pub fn set_pc(&mut self, pc: u64) {
        self.x[REG_PC] = pc;
    }

    /// Reads a floating-point register as raw bits.
    #[inline(always)]
    pub fn read_f(&self, idx: usize) -> u64 {
        self.f[idx]
    }

    /// Writes a floating-point register as raw bits.
    #[inline(always)]
    pub fn write_f(&mut self, idx: usize, val: u64) {
        self.f[idx] = val;
    }

    /// Dumps the integer registers and PC to stderr.
    ///
    /// Useful for debugging guest state when a hart is parked.
    pub fn dump(&self) {
        for i in (0..32).step_by(2) {
            eprintln!(
                "x{:<2}={:#018x} x{:<2}={:#018x}",
                i,
                self.read(i),
                i + 1,
                self.read(i + 1)
            );
        }
        eprintln!("pc ={:#018x}", self.pc());
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}
