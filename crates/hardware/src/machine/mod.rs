//! The virtual machine.
//!
//! Exactly one `Machine` exists per virtual system. It owns guest RAM, the
//! monotonic timer, and the collection of harts, and composes them without
//! duplicating any per-hart logic: lifecycle, trap, and interrupt behavior
//! all live on the hart side. Peripheral device emulation attaches from the
//! outside and interacts with harts purely through interrupt lines.

/// Guest RAM buffer.
pub mod ram;

/// Monotonic timer and comparators.
pub mod timer;

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::common::MachineError;
use crate::config::Config;
use crate::core::hart::{Hart, HartHandle, HartRunner};
use crate::exec::ExecutionEngine;
use self::ram::Ram;
use self::timer::Timer;

/// Machine power state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerState {
    /// All hart threads parked.
    Off = 0,
    /// Hart threads running.
    On = 1,
    /// A reset was requested; the supervisor tears down and rebuilds.
    Reset = 2,
}

impl PowerState {
    fn from_u32(val: u32) -> Self {
        match val {
            1 => PowerState::On,
            2 => PowerState::Reset,
            _ => PowerState::Off,
        }
    }
}

/// One virtual system: guest RAM, timer, and harts.
///
/// Harts are added before the first start and live as long as the machine.
/// Dropping the machine only after every hart thread has been joined is
/// guaranteed by construction: `pause_all` is the only way threads park, and
/// the handles own the join handles.
#[derive(Debug)]
pub struct Machine {
    config: Config,
    ram: Arc<Ram>,
    timer: Arc<Timer>,
    harts: Vec<HartHandle>,
    power: AtomicU32,
}

impl Machine {
    /// Constructs a machine from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError`] for a zero-sized memory region, a wrapping
    /// memory region, or a zero hart count.
    pub fn new(config: Config) -> Result<Self, MachineError> {
        if config.machine.ram_size == 0 {
            return Err(MachineError::NoMemory);
        }
        if config
            .machine
            .ram_base
            .checked_add(config.machine.ram_size)
            .is_none()
        {
            return Err(MachineError::MemoryOverflow {
                base: config.machine.ram_base,
                size: config.machine.ram_size,
            });
        }
        if config.machine.hart_count == 0 {
            return Err(MachineError::NoHarts);
        }

        let ram = Arc::new(Ram::new(
            config.machine.ram_base,
            config.machine.ram_size as usize,
        ));
        let timer = Arc::new(Timer::new(config.machine.timer_freq_hz));

        Ok(Self {
            config,
            ram,
            timer,
            harts: Vec::new(),
            power: AtomicU32::new(PowerState::Off as u32),
        })
    }

    /// Creates the configured number of harts, one engine per hart.
    ///
    /// The factory receives the hart index and supplies its execution engine.
    pub fn create_harts<F>(&mut self, mut engine_factory: F)
    where
        F: FnMut(usize) -> Box<dyn ExecutionEngine>,
    {
        for _ in 0..self.config.machine.hart_count {
            let engine = engine_factory(self.harts.len());
            let _ = self.add_hart(engine);
        }
    }

    /// Adds one hart wired to this machine's memory and timer.
    ///
    /// Returns the new hart's index (also its hart identifier).
    pub fn add_hart(&mut self, engine: Box<dyn ExecutionEngine>) -> usize {
        let hartid = self.harts.len();
        let mut hart = Hart::new(
            Arc::clone(&self.ram),
            Arc::clone(&self.timer),
            hartid as u64,
            &self.config,
        );
        hart.prepare(&self.config);
        let runner = HartRunner::new(hart, engine);
        self.harts
            .push(HartHandle::new(runner, self.config.hart.isolation));
        hartid
    }

    /// Spawns every hart thread and powers the machine on.
    pub fn start(&mut self) {
        for hart in &mut self.harts {
            hart.spawn();
        }
        self.power.store(PowerState::On as u32, Ordering::Relaxed);
        tracing::info!(harts = self.harts.len(), "machine started");
    }

    /// Pauses every hart and blocks until all threads have parked.
    ///
    /// Pause requests are queued for all harts first so they wind down in
    /// parallel; the joins then collect them one by one.
    pub fn pause_all(&mut self) {
        for hart in &self.harts {
            hart.queue_pause();
        }
        for hart in &mut self.harts {
            hart.pause();
        }
        self.power.store(PowerState::Off as u32, Ordering::Relaxed);
        tracing::info!(harts = self.harts.len(), "machine paused");
    }

    /// Latches due timer interrupts on every hart.
    ///
    /// Driven by the supervisor's polling cadence; harts sleeping in
    /// wait-for-interrupt are skipped because the wait checks deadlines
    /// precisely itself.
    pub fn poll_timers(&self) {
        for hart in &self.harts {
            hart.control().check_timer(&self.timer);
        }
    }

    /// Raises an interrupt line on one hart; unknown hart indices are
    /// silently ignored.
    pub fn raise_irq(&self, hart: usize, line: u32) {
        if let Some(handle) = self.harts.get(hart) {
            handle.raise_irq(line);
        }
    }

    /// Clears an interrupt line on one hart; unknown hart indices are
    /// silently ignored.
    pub fn clear_irq(&self, hart: usize, line: u32) {
        if let Some(handle) = self.harts.get(hart) {
            handle.clear_irq(line);
        }
    }

    /// Returns the number of harts.
    pub fn num_harts(&self) -> usize {
        self.harts.len()
    }

    /// Returns one hart handle.
    pub fn hart(&self, idx: usize) -> Option<&HartHandle> {
        self.harts.get(idx)
    }

    /// Returns one hart handle mutably.
    pub fn hart_mut(&mut self, idx: usize) -> Option<&mut HartHandle> {
        self.harts.get_mut(idx)
    }

    /// Returns the guest RAM region.
    pub fn ram(&self) -> &Arc<Ram> {
        &self.ram
    }

    /// Returns the machine timer.
    pub fn timer(&self) -> &Arc<Timer> {
        &self.timer
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the machine power state.
    pub fn power_state(&self) -> PowerState {
        PowerState::from_u32(self.power.load(Ordering::Relaxed))
    }

    /// Sets the machine power state; device emulation uses this to request
    /// shutdown or reboot, observed by the supervisor loop.
    pub fn set_power_state(&self, state: PowerState) {
        self.power.store(state as u32, Ordering::Relaxed);
    }
}
