//! Monotonic machine timer and per-hart comparators.
//!
//! The timer derives a guest tick counter from the host monotonic clock at a
//! configured frequency. Each hart owns two comparators (Machine-level and
//! Supervisor-level); a comparator at or past the current counter raises the
//! corresponding timer interrupt line. Comparators are plain atomics so CSR
//! emulation on the hart thread and the machine's polling thread can touch
//! them without locks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic guest timer.
#[derive(Debug)]
pub struct Timer {
    freq_hz: u64,
    epoch: Instant,
}

impl Timer {
    /// Creates a timer ticking at `freq_hz` from now.
    pub fn new(freq_hz: u64) -> Self {
        Self {
            freq_hz: freq_hz.max(1),
            epoch: Instant::now(),
        }
    }

    /// Returns the configured tick frequency in Hz.
    pub fn freq_hz(&self) -> u64 {
        self.freq_hz
    }

    /// Returns the current tick count.
    pub fn now(&self) -> u64 {
        let nanos = self.epoch.elapsed().as_nanos();
        ((nanos * u128::from(self.freq_hz)) / 1_000_000_000) as u64
    }

    /// Returns the wall-clock duration until `deadline` ticks, zero when the
    /// deadline has already passed.
    pub fn until(&self, deadline: u64) -> Duration {
        let remaining = deadline.saturating_sub(self.now());
        let nanos = (u128::from(remaining) * 1_000_000_000) / u128::from(self.freq_hz);
        // A deadline in the future always gets a nonzero wait to avoid a
        // busy spin at sub-tick resolution.
        Duration::from_nanos((nanos as u64).max(u64::from(remaining > 0)))
    }
}

/// One timer comparator.
///
/// Disarmed at `u64::MAX`; the counter never reaches it in practice.
#[derive(Debug)]
pub struct TimeComparator(AtomicU64);

impl TimeComparator {
    /// Creates a disarmed comparator.
    pub fn new() -> Self {
        Self(AtomicU64::new(u64::MAX))
    }

    /// Reads the comparator deadline in ticks.
    #[inline(always)]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    /// Arms (or disarms, with `u64::MAX`) the comparator.
    #[inline(always)]
    pub fn set(&self, deadline: u64) {
        self.0.store(deadline, Ordering::Relaxed);
    }
}

impl Default for TimeComparator {
    fn default() -> Self {
        Self::new()
    }
}
