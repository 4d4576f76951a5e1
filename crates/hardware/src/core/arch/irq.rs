//! Interrupt line numbering.
//!
//! Line numbers double as bit indices into the pending/enable masks and as the
//! low bits of the cause register on delivery. Delivery priority is fixed:
//! the highest-numbered pending line wins. Guest software may depend on this
//! exact order, so it is preserved as-is.

/// User software interrupt line.
pub const USER_SOFTWARE: u32 = 0x0;

/// Supervisor software interrupt line.
pub const SUPERVISOR_SOFTWARE: u32 = 0x1;

/// Machine software interrupt line.
pub const MACHINE_SOFTWARE: u32 = 0x3;

/// User timer interrupt line.
pub const USER_TIMER: u32 = 0x4;

/// Supervisor timer interrupt line.
pub const SUPERVISOR_TIMER: u32 = 0x5;

/// Machine timer interrupt line.
pub const MACHINE_TIMER: u32 = 0x7;

/// User external interrupt line.
pub const USER_EXTERNAL: u32 = 0x8;

/// Supervisor external interrupt line.
pub const SUPERVISOR_EXTERNAL: u32 = 0x9;

/// Machine external interrupt line.
pub const MACHINE_EXTERNAL: u32 = 0xB;

/// Highest line number considered by the delivery scan.
pub const LINE_MAX: u32 = 0xB;

/// Number of addressable interrupt lines (width of the pending mask).
pub const LINE_COUNT: u32 = 64;
