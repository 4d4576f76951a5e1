//! Privilege and register width modes.
//!
//! This module defines the execution modes a hart moves through. It implements
//! the following:
//! 1. **Mode Classification:** User (U), Supervisor (S), Hypervisor (H), and Machine (M) levels.
//! 2. **Ordering:** Numeric comparison used by the trap delegation walk.
//! 3. **Width Modes:** The 32/64-bit register width states recomputed on privilege switches.

/// Privilege mode levels.
///
/// Four levels control access to system state; Machine mode is the highest.
/// The numeric ordering matters: trap delegation walks downward from Machine,
/// and interrupt delivery compares target against current level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum PrivilegeMode {
    /// User mode (U-mode).
    ///
    /// Lowest privilege level for application code.
    User = 0,

    /// Supervisor mode (S-mode).
    ///
    /// Intermediate privilege level for operating system kernels.
    Supervisor = 1,

    /// Hypervisor mode (HS-mode).
    ///
    /// Privilege level for hypervisor-extension supervisors.
    Hypervisor = 2,

    /// Machine mode (M-mode).
    ///
    /// Highest privilege level for firmware and low-level system control.
    Machine = 3,
}

/// Number of privilege levels.
pub const PRIVILEGE_COUNT: usize = 4;

impl PrivilegeMode {
    /// Converts a `u8` value to a privilege mode.
    ///
    /// Invalid values default to `Machine`, matching the reset state.
    pub fn from_u8(val: u8) -> Self {
        match val {
            0 => PrivilegeMode::User,
            1 => PrivilegeMode::Supervisor,
            2 => PrivilegeMode::Hypervisor,
            _ => PrivilegeMode::Machine,
        }
    }

    /// Converts a privilege mode to its `u8` representation.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Returns the mode as an index into the per-level CSR arrays.
    #[inline(always)]
    pub fn idx(self) -> usize {
        self as usize
    }

    /// Returns the next lower privilege mode; User maps to itself.
    pub fn lower(self) -> Self {
        match self {
            PrivilegeMode::Machine => PrivilegeMode::Hypervisor,
            PrivilegeMode::Hypervisor => PrivilegeMode::Supervisor,
            PrivilegeMode::Supervisor | PrivilegeMode::User => PrivilegeMode::User,
        }
    }

    /// Returns the human-readable name of the privilege mode.
    pub fn name(&self) -> &'static str {
        match self {
            PrivilegeMode::User => "User",
            PrivilegeMode::Supervisor => "Supervisor",
            PrivilegeMode::Hypervisor => "Hypervisor",
            PrivilegeMode::Machine => "Machine",
        }
    }
}

impl std::fmt::Display for PrivilegeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Register width mode.
///
/// The width is never stored redundantly in CSR state; it is recomputed from
/// the privilege-specific status bits whenever the privilege level changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Xlen {
    /// 32-bit register width.
    X32,
    /// 64-bit register width.
    X64,
}

impl Xlen {
    /// Returns the register width in bits.
    pub fn bits(self) -> u32 {
        match self {
            Xlen::X32 => 32,
            Xlen::X64 => 64,
        }
    }

    /// Returns the interrupt-indicator mask for cause registers at this width.
    ///
    /// The high bit of the cause register distinguishes interrupts from
    /// synchronous exceptions, so its position depends on the active width.
    #[inline(always)]
    pub fn cause_interrupt_bit(self) -> u64 {
        match self {
            Xlen::X32 => 0x8000_0000,
            Xlen::X64 => 0x8000_0000_0000_0000,
        }
    }
}

impl std::fmt::Display for Xlen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rv{}", self.bits())
    }
}
