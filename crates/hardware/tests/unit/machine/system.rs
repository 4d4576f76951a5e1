//! # Machine Tests
//!
//! Unit tests for machine construction, multi-hart start/pause, guest RAM
//! access helpers, and power state bookkeeping.

use pretty_assertions::assert_eq;
use rvhart_core::machine::{Machine, PowerState};

use crate::common::harness::test_config;
use crate::common::mocks::engine::CountingEngine;

fn two_hart_machine() -> Machine {
    let mut config = test_config();
    config.machine.hart_count = 2;
    let mut machine = match Machine::new(config) {
        Ok(machine) => machine,
        Err(err) => panic!("machine construction failed: {err}"),
    };
    machine.create_harts(|_| Box::new(CountingEngine::new(32)));
    machine
}

#[test]
fn test_create_harts_builds_configured_count() {
    let machine = two_hart_machine();
    assert_eq!(machine.num_harts(), 2);
    assert!(machine.hart(0).is_some());
    assert!(machine.hart(1).is_some());
    assert!(machine.hart(2).is_none());
}

#[test]
fn test_hart_ids_match_indices() {
    let machine = two_hart_machine();
    for idx in 0..2 {
        let Some(hart) = machine.hart(idx).and_then(|h| h.hart()) else {
            panic!("hart {idx} missing");
        };
        assert_eq!(hart.csr.hartid, idx as u64);
    }
}

#[test]
fn test_start_and_pause_all_round_trip() {
    let mut machine = two_hart_machine();

    machine.start();
    assert_eq!(machine.power_state(), PowerState::On);
    for idx in 0..2 {
        let Some(handle) = machine.hart(idx) else {
            panic!("hart {idx} missing");
        };
        assert!(handle.is_running());
    }

    machine.pause_all();
    assert_eq!(machine.power_state(), PowerState::Off);
    for idx in 0..2 {
        let Some(handle) = machine.hart(idx) else {
            panic!("hart {idx} missing");
        };
        assert!(!handle.is_running());
        assert!(handle.hart().is_some());
    }
}

#[test]
fn test_irq_routing_ignores_unknown_hart() {
    let machine = two_hart_machine();
    // Out-of-range hart indices are contract violations, silently ignored.
    machine.raise_irq(99, 7);
    machine.clear_irq(99, 7);

    machine.raise_irq(1, 7);
    let Some(handle) = machine.hart(1) else {
        panic!("hart 1 missing");
    };
    assert_ne!(handle.control().raised_lines() & (1 << 7), 0);
}

#[test]
fn test_power_state_transitions() {
    let machine = two_hart_machine();
    assert_eq!(machine.power_state(), PowerState::Off);

    machine.set_power_state(PowerState::Reset);
    assert_eq!(machine.power_state(), PowerState::Reset);
}

// === Guest RAM ===

#[test]
fn test_ram_round_trip() {
    let machine = two_hart_machine();
    let ram = machine.ram();
    let base = ram.base();

    assert!(ram.write_bytes(base + 0x100, &[1, 2, 3, 4]));
    let mut out = [0u8; 4];
    assert!(ram.read_bytes(base + 0x100, &mut out));
    assert_eq!(out, [1, 2, 3, 4]);
}

#[test]
fn test_ram_rejects_out_of_range_access() {
    let machine = two_hart_machine();
    let ram = machine.ram();

    assert!(!ram.write_bytes(ram.base() - 1, &[0]));
    assert!(!ram.write_bytes(ram.base() + ram.len() as u64, &[0]));
    let mut out = [0u8; 8];
    assert!(!ram.read_bytes(ram.base() + ram.len() as u64 - 4, &mut out));
}

#[test]
fn test_ram_starts_zeroed() {
    let machine = two_hart_machine();
    let ram = machine.ram();
    let mut out = [0xffu8; 16];
    assert!(ram.read_bytes(ram.base(), &mut out));
    assert_eq!(out, [0u8; 16]);
}
