//! Test harness for machine and hart construction.

use std::sync::Arc;

use rvhart_core::config::Config;
use rvhart_core::core::Hart;
use rvhart_core::core::hart::HartControl;
use rvhart_core::exec::ExecutionEngine;
use rvhart_core::machine::Machine;
use rvhart_core::machine::ram::Ram;
use rvhart_core::machine::timer::Timer;

use crate::common::mocks::engine::NopEngine;

/// Small-footprint configuration used by most tests.
///
/// Isolation is disabled so hart threads spawned in tests do not restrict the
/// test process, and RAM is kept tiny to make machine construction cheap.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.machine.ram_size = 1024 * 1024;
    config.machine.hart_count = 1;
    config.hart.isolation = false;
    config
}

pub struct TestContext {
    pub machine: Machine,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    /// Builds a one-hart machine with a do-nothing engine.
    pub fn new() -> Self {
        Self::with_engine(Box::new(NopEngine))
    }

    /// Builds a one-hart machine around the supplied engine.
    pub fn with_engine(engine: Box<dyn ExecutionEngine>) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter("warn")
            .try_init();

        let mut machine = match Machine::new(test_config()) {
            Ok(machine) => machine,
            Err(err) => panic!("test machine construction failed: {err}"),
        };
        let _ = machine.add_hart(engine);
        Self { machine }
    }

    /// Accessor for the parked hart.
    ///
    /// # Panics
    ///
    /// Panics when the hart thread is running; tests touch hart state only
    /// while it is parked.
    pub fn hart(&self) -> &Hart {
        match self.machine.hart(0).and_then(|h| h.hart()) {
            Some(hart) => hart,
            None => panic!("hart 0 is not parked"),
        }
    }

    /// Mutable accessor for the parked hart.
    pub fn hart_mut(&mut self) -> &mut Hart {
        match self.machine.hart_mut(0).and_then(|h| h.hart_mut()) {
            Some(hart) => hart,
            None => panic!("hart 0 is not parked"),
        }
    }

    /// Clones the hart's shared control block.
    pub fn control(&self) -> Arc<HartControl> {
        match self.machine.hart(0) {
            Some(handle) => Arc::clone(handle.control()),
            None => panic!("hart 0 missing"),
        }
    }
}

/// Builds a standalone hart without a machine, for delivery-logic tests that
/// never spawn a thread.
pub fn bare_hart() -> Hart {
    let config = test_config();
    let ram = Arc::new(Ram::new(
        config.machine.ram_base,
        config.machine.ram_size as usize,
    ));
    let timer = Arc::new(Timer::new(config.machine.timer_freq_hz));
    let mut hart = Hart::new(ram, timer, 0, &config);
    hart.prepare(&config);
    hart
}
