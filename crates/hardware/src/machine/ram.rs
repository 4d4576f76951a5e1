//! Guest RAM buffer.
//!
//! This module provides a wrapper around raw memory allocation for guest RAM.
//! On Unix it uses `mmap` for lazy allocation, so large guest memories only
//! consume host pages as the guest touches them. The buffer is shared across
//! all hart threads and DMA-capable device emulation; arbitration of that
//! access is delegated to the memory collaborator's own discipline.

use std::fmt;

/// Shared guest RAM region.
///
/// Access helpers are deliberately best-effort: out-of-range operations are
/// ignored and reported by return value, never raised as errors, since they
/// are contract violations internal to the emulation.
pub struct Ram {
    ptr: *mut u8,
    size: usize,
    base: u64,
    is_mmap: bool,
}

// SAFETY: the buffer is plain memory shared between hart threads and device
// emulation, exactly like physical DRAM on a real bus. Concurrent access
// discipline is owned by the memory collaborator.
unsafe impl Send for Ram {}
unsafe impl Sync for Ram {}

impl Ram {
    /// Allocates a guest RAM region of `size` bytes at guest physical `base`.
    ///
    /// On Unix the region is `mmap`-backed for lazy allocation; elsewhere it
    /// falls back to a zeroed heap allocation.
    ///
    /// # Panics
    ///
    /// Panics when the host cannot provide the mapping; a machine cannot
    /// exist without its memory.
    pub fn new(base: u64, size: usize) -> Self {
        #[cfg(unix)]
        {
            use std::ptr;
            // SAFETY: anonymous private mapping with no requested address.
            let ptr = unsafe {
                libc::mmap(
                    ptr::null_mut(),
                    size,
                    libc::PROT_READ | libc::PROT_WRITE,
                    libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                    -1,
                    0,
                )
            };

            assert!(
                ptr != libc::MAP_FAILED,
                "failed to mmap guest RAM of size {size}"
            );

            Self {
                ptr: ptr as *mut u8,
                size,
                base,
                is_mmap: true,
            }
        }

        #[cfg(not(unix))]
        {
            let mut vec = vec![0u8; size];
            let ptr = vec.as_mut_ptr();
            std::mem::forget(vec);
            Self {
                ptr,
                size,
                base,
                is_mmap: false,
            }
        }
    }

    /// Returns the guest physical base address of the region.
    pub fn base(&self) -> u64 {
        self.base
    }

    /// Returns the region size in bytes.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns true for a zero-sized region.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the host pointer backing the region.
    ///
    /// The memory collaborator builds its fast-path page pointers from this.
    pub fn host_ptr(&self) -> *mut u8 {
        self.ptr
    }

    /// Copies bytes into guest RAM at physical address `addr`.
    ///
    /// Returns false without copying when any byte falls outside the region.
    pub fn write_bytes(&self, addr: u64, data: &[u8]) -> bool {
        let Some(offset) = self.offset_of(addr, data.len()) else {
            return false;
        };
        // SAFETY: offset_of proved the range lies inside the mapping. The
        // buffer has DRAM semantics; racing writers are the collaborator's
        // problem, not a memory-safety one, since the region is plain bytes.
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), self.ptr.add(offset), data.len());
        }
        true
    }

    /// Copies bytes out of guest RAM at physical address `addr`.
    ///
    /// Returns false without copying when any byte falls outside the region.
    pub fn read_bytes(&self, addr: u64, out: &mut [u8]) -> bool {
        let Some(offset) = self.offset_of(addr, out.len()) else {
            return false;
        };
        // SAFETY: offset_of proved the range lies inside the mapping.
        unsafe {
            std::ptr::copy_nonoverlapping(self.ptr.add(offset), out.as_mut_ptr(), out.len());
        }
        true
    }

    fn offset_of(&self, addr: u64, len: usize) -> Option<usize> {
        let offset = addr.checked_sub(self.base)?;
        let end = offset.checked_add(len as u64)?;
        if end <= self.size as u64 {
            Some(offset as usize)
        } else {
            None
        }
    }
}

impl Drop for Ram {
    fn drop(&mut self) {
        #[cfg(unix)]
        if self.is_mmap {
            // SAFETY: ptr/size describe the mapping created in new().
            let _ = unsafe { libc::munmap(self.ptr as *mut libc::c_void, self.size) };
            return;
        }
        if !self.is_mmap {
            // SAFETY: reconstructs the Vec forgotten in new().
            drop(unsafe { Vec::from_raw_parts(self.ptr, self.size, self.size) });
        }
    }
}

impl fmt::Debug for Ram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ram")
            .field("base", &format_args!("{:#x}", self.base))
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}
