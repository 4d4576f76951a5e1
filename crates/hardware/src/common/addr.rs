//! Physical and Virtual Address types.
//!
//! This module defines strong types for physical and virtual addresses to prevent
//! accidental mixing of address spaces. It provides the following:
//! 1. **Type Safety:** Distinguishes between virtual and physical address spaces at compile time.
//! 2. **Address Manipulation:** Helper methods for extracting page numbers and offsets.
//! 3. **Cache Integration:** Acts as the key type for the translation cache.

/// Page size in bytes (4KB).
pub const PAGE_SIZE: u64 = 4096;

/// Number of bits to shift to convert between bytes and pages.
pub const PAGE_SHIFT: u64 = 12;

/// Mask for extracting the page offset from an address.
pub const PAGE_OFFSET_MASK: u64 = PAGE_SIZE - 1;

/// A virtual address in the guest address space.
///
/// Virtual addresses are used by guest software and must be translated to physical
/// addresses before accessing memory. The translation algorithm itself lives in the
/// memory collaborator; this core only caches and invalidates its results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct VirtAddr(pub u64);

/// A physical address in the guest address space.
///
/// Physical addresses represent emulated hardware memory locations and are used
/// after virtual-to-physical address translation has completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct PhysAddr(pub u64);

impl VirtAddr {
    /// Creates a new virtual address from a raw 64-bit value.
    #[inline(always)]
    pub fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the raw 64-bit address value.
    #[inline(always)]
    pub fn val(self) -> u64 {
        self.0
    }

    /// Extracts the virtual page number (address shifted down by the page size).
    #[inline(always)]
    pub fn page_number(self) -> u64 {
        self.0 >> PAGE_SHIFT
    }

    /// Extracts the page offset from the virtual address.
    ///
    /// The page offset is the lower 12 bits of the address, representing
    /// the byte offset within a 4KB page.
    pub fn page_offset(self) -> u64 {
        self.0 & PAGE_OFFSET_MASK
    }
}

impl PhysAddr {
    /// Creates a new physical address from a raw 64-bit value.
    #[inline(always)]
    pub fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the raw 64-bit address value.
    #[inline(always)]
    pub fn val(self) -> u64 {
        self.0
    }

    /// Extracts the physical page number (address shifted down by the page size).
    #[inline(always)]
    pub fn page_number(self) -> u64 {
        self.0 >> PAGE_SHIFT
    }
}
