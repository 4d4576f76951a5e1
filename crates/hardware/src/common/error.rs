//! Architectural exception causes and host error types.
//!
//! This module defines the error handling split used by the engine:
//! 1. **Architectural Exceptions:** Synchronous guest-visible trap causes, routed
//!    through the delegation protocol and never fatal to the host process.
//! 2. **Host Errors:** `thiserror`-derived construction failures for the machine,
//!    the only conditions reported as Rust errors to the embedder.

use std::fmt;

use thiserror::Error;

/// Synchronous exception causes as encoded in the per-level cause register.
///
/// Discriminant values are the architectural cause codes. The associated fault
/// address or instruction encoding travels separately as the trap value, which
/// keeps the cause itself `Copy` and cheap to store per privilege level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum Exception {
    /// Instruction address misaligned.
    InstructionMisaligned = 0x0,
    /// Instruction access fault.
    InstructionFetchFault = 0x1,
    /// Illegal instruction encoding.
    IllegalInstruction = 0x2,
    /// Breakpoint instruction or hardware breakpoint.
    Breakpoint = 0x3,
    /// Load address misaligned.
    LoadMisaligned = 0x4,
    /// Load access fault.
    LoadFault = 0x5,
    /// Store/AMO address misaligned.
    StoreMisaligned = 0x6,
    /// Store/AMO access fault.
    StoreFault = 0x7,
    /// Environment call from User mode.
    EnvCallUser = 0x8,
    /// Environment call from Supervisor mode.
    EnvCallSupervisor = 0x9,
    /// Environment call from Hypervisor mode.
    EnvCallHypervisor = 0xA,
    /// Environment call from Machine mode.
    EnvCallMachine = 0xB,
    /// Instruction page fault.
    InstructionPageFault = 0xC,
    /// Load page fault.
    LoadPageFault = 0xD,
    /// Store/AMO page fault.
    StorePageFault = 0xF,
}

impl Exception {
    /// Returns the architectural cause code.
    #[inline(always)]
    pub fn code(self) -> u64 {
        self as u64
    }

    /// Returns true for the environment-call cause range.
    ///
    /// Environment calls have a well-known continuation point, so taking one
    /// keeps any in-flight compiled block alive; every other cause discards it.
    #[inline(always)]
    pub fn is_env_call(self) -> bool {
        matches!(
            self,
            Exception::EnvCallUser
                | Exception::EnvCallSupervisor
                | Exception::EnvCallHypervisor
                | Exception::EnvCallMachine
        )
    }

    /// Returns the human-readable name of the exception cause.
    pub fn name(self) -> &'static str {
        match self {
            Exception::InstructionMisaligned => "InstructionMisaligned",
            Exception::InstructionFetchFault => "InstructionFetchFault",
            Exception::IllegalInstruction => "IllegalInstruction",
            Exception::Breakpoint => "Breakpoint",
            Exception::LoadMisaligned => "LoadMisaligned",
            Exception::LoadFault => "LoadFault",
            Exception::StoreMisaligned => "StoreMisaligned",
            Exception::StoreFault => "StoreFault",
            Exception::EnvCallUser => "EnvCallUser",
            Exception::EnvCallSupervisor => "EnvCallSupervisor",
            Exception::EnvCallHypervisor => "EnvCallHypervisor",
            Exception::EnvCallMachine => "EnvCallMachine",
            Exception::InstructionPageFault => "InstructionPageFault",
            Exception::LoadPageFault => "LoadPageFault",
            Exception::StorePageFault => "StorePageFault",
        }
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:#x})", self.name(), self.code())
    }
}

/// Host-level machine construction errors.
///
/// These are the only conditions surfaced as Rust errors: a machine cannot
/// exist without valid base state. Everything guest-visible becomes trap state
/// instead, and runtime contract violations (bad hart index, out-of-range
/// interrupt line) are silently ignored at the call site.
#[derive(Debug, Error)]
pub enum MachineError {
    /// The configured guest RAM size was zero.
    #[error("guest memory size must be nonzero")]
    NoMemory,

    /// The configured guest RAM region wraps the physical address space.
    #[error("guest memory region {base:#x}+{size:#x} overflows the address space")]
    MemoryOverflow {
        /// Configured base address of the region.
        base: u64,
        /// Configured size of the region in bytes.
        size: u64,
    },

    /// The configured hart count was zero.
    #[error("a machine requires at least one hart")]
    NoHarts,
}
