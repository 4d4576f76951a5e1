//! # Trap Handling Tests
//!
//! Unit tests for synchronous trap delivery: the delegation walk, context
//! saving, the privilege trap stack, and the userland deferral mode.

use pretty_assertions::assert_eq;
use rstest::rstest;
use rvhart_core::common::Exception;
use rvhart_core::core::arch::mode::PrivilegeMode;
use rvhart_core::core::hart::HartRunner;

use crate::common::harness::bare_hart;
use crate::common::mocks::engine::TrapOnceEngine;

// === Delegation Walk ===

#[test]
fn test_trap_at_machine_stays_at_machine() {
    let mut hart = bare_hart();
    hart.csr.tvec[PrivilegeMode::Machine.idx()] = 0x8000_0000;
    hart.regs.set_pc(0x8000_1000);

    hart.trap(Exception::IllegalInstruction, 0xbad);

    assert_eq!(hart.privilege(), PrivilegeMode::Machine);
    assert_eq!(hart.csr.epc[PrivilegeMode::Machine.idx()], 0x8000_1000);
    assert_eq!(hart.csr.cause[PrivilegeMode::Machine.idx()], 0x2);
    assert_eq!(hart.csr.tval[PrivilegeMode::Machine.idx()], 0xbad);
}

#[test]
fn test_trap_at_machine_never_delegates_even_with_masks_set() {
    let mut hart = bare_hart();
    hart.csr.edeleg[PrivilegeMode::Machine.idx()] = 1 << 0x2;
    hart.csr.edeleg[PrivilegeMode::Hypervisor.idx()] = 1 << 0x2;
    hart.csr.tvec[PrivilegeMode::Machine.idx()] = 0x8000_0000;

    hart.trap(Exception::IllegalInstruction, 0);

    assert_eq!(hart.privilege(), PrivilegeMode::Machine);
}

#[test]
fn test_load_page_fault_without_delegation_targets_machine() {
    // Supervisor-level hart, Machine delegation bit for cause 0xD clear:
    // the trap must resolve to Machine, not Supervisor.
    let mut hart = bare_hart();
    hart.switch_privilege(PrivilegeMode::Supervisor);
    hart.csr.tvec[PrivilegeMode::Machine.idx()] = 0x8000_0000;
    hart.regs.set_pc(0x4000);

    hart.trap(Exception::LoadPageFault, 0xdead_0000);

    assert_eq!(hart.privilege(), PrivilegeMode::Machine);
    assert_eq!(hart.csr.cause[PrivilegeMode::Machine.idx()], 0xD);
    assert_eq!(hart.csr.tval[PrivilegeMode::Machine.idx()], 0xdead_0000);
    assert_eq!(hart.csr.epc[PrivilegeMode::Machine.idx()], 0x4000);
}

#[test]
fn test_trap_delegates_down_to_supervisor() {
    let mut hart = bare_hart();
    hart.switch_privilege(PrivilegeMode::User);
    hart.csr.edeleg[PrivilegeMode::Machine.idx()] = 1 << 0xC;
    hart.csr.edeleg[PrivilegeMode::Hypervisor.idx()] = 1 << 0xC;
    hart.csr.tvec[PrivilegeMode::Supervisor.idx()] = 0x8000_2000;
    hart.regs.set_pc(0x1000);

    hart.trap(Exception::InstructionPageFault, 0x1000);

    assert_eq!(hart.privilege(), PrivilegeMode::Supervisor);
    assert_eq!(hart.csr.cause[PrivilegeMode::Supervisor.idx()], 0xC);
    assert_eq!(hart.csr.epc[PrivilegeMode::Supervisor.idx()], 0x1000);
    // Machine-level registers stay untouched.
    assert_eq!(hart.csr.cause[PrivilegeMode::Machine.idx()], 0);
}

#[test]
fn test_trap_delegation_stops_where_mask_clear() {
    // Machine delegates, Hypervisor does not: the trap lands at Hypervisor.
    let mut hart = bare_hart();
    hart.switch_privilege(PrivilegeMode::User);
    hart.csr.edeleg[PrivilegeMode::Machine.idx()] = 1 << 0x3;
    hart.csr.tvec[PrivilegeMode::Hypervisor.idx()] = 0x8000_3000;

    hart.trap(Exception::Breakpoint, 0);

    assert_eq!(hart.privilege(), PrivilegeMode::Hypervisor);
    assert_eq!(hart.csr.cause[PrivilegeMode::Hypervisor.idx()], 0x3);
}

// === Trap Vector ===

#[test]
fn test_exceptions_are_never_vectored() {
    // Low tvec bit set requests vectored mode, but exceptions always use the
    // base address with the low two bits cleared.
    let mut hart = bare_hart();
    hart.csr.tvec[PrivilegeMode::Machine.idx()] = 0x8000_0001;

    hart.trap(Exception::IllegalInstruction, 0);

    assert_eq!(hart.pending_trap(), Some(0x8000_0000));
}

#[test]
fn test_trap_pc_meaningful_only_while_pending() {
    let mut hart = bare_hart();
    assert_eq!(hart.pending_trap(), None);

    hart.csr.tvec[PrivilegeMode::Machine.idx()] = 0x8000_0000;
    hart.trap(Exception::Breakpoint, 0);
    assert_eq!(hart.pending_trap(), Some(0x8000_0000));
}

// === Privilege Trap Stack ===

#[test]
fn test_trap_to_machine_pushes_status_stack() {
    let mut hart = bare_hart();
    hart.switch_privilege(PrivilegeMode::Supervisor);
    // Machine interrupt enable set before the trap.
    hart.csr.status |= 1 << 3;
    hart.csr.tvec[PrivilegeMode::Machine.idx()] = 0x8000_0000;

    hart.trap(Exception::IllegalInstruction, 0);

    // MPP = Supervisor, MPIE = old MIE, MIE cleared.
    assert_eq!((hart.csr.status >> 11) & 0b11, 1);
    assert_eq!((hart.csr.status >> 7) & 1, 1);
    assert_eq!((hart.csr.status >> 3) & 1, 0);
}

#[test]
fn test_trap_to_supervisor_pushes_status_stack() {
    let mut hart = bare_hart();
    hart.switch_privilege(PrivilegeMode::User);
    hart.csr.status |= 1 << 1;
    hart.csr.edeleg[PrivilegeMode::Machine.idx()] = 1 << 0x2;
    hart.csr.edeleg[PrivilegeMode::Hypervisor.idx()] = 1 << 0x2;
    hart.csr.tvec[PrivilegeMode::Supervisor.idx()] = 0x8000_2000;

    hart.trap(Exception::IllegalInstruction, 0);

    // SPP = User, SPIE = old SIE, SIE cleared.
    assert_eq!((hart.csr.status >> 8) & 1, 0);
    assert_eq!((hart.csr.status >> 5) & 1, 1);
    assert_eq!((hart.csr.status >> 1) & 1, 0);
}

// === Compiled Block Interaction ===

#[rstest]
#[case(Exception::EnvCallUser)]
#[case(Exception::EnvCallSupervisor)]
#[case(Exception::EnvCallHypervisor)]
#[case(Exception::EnvCallMachine)]
fn test_env_calls_keep_in_flight_block(#[case] cause: Exception) {
    let mut hart = bare_hart();
    hart.begin_block();

    hart.trap(cause, 0);

    assert!(hart.block_in_flight());
}

#[rstest]
#[case(Exception::IllegalInstruction)]
#[case(Exception::LoadPageFault)]
#[case(Exception::Breakpoint)]
#[case(Exception::StoreFault)]
fn test_other_causes_discard_in_flight_block(#[case] cause: Exception) {
    let mut hart = bare_hart();
    hart.begin_block();

    hart.trap(cause, 0);

    assert!(!hart.block_in_flight());
}

// === Userland Deferral ===

#[test]
fn test_userland_trap_is_deferred_not_vectored() {
    let hart = bare_hart();
    let engine = TrapOnceEngine::new(Exception::EnvCallUser, 0);
    let mut runner = HartRunner::new(hart, Box::new(engine));
    runner.hart.csr.tvec[PrivilegeMode::Machine.idx()] = 0x8000_0000;
    runner.hart.regs.set_pc(0x5000);

    let cause = runner.run_userland();

    assert_eq!(cause, 0x8);
    assert_eq!(runner.hart.csr.cause[PrivilegeMode::User.idx()], 0x8);
    // No vectoring happened: privilege unchanged, PC restored to the trap
    // point rather than any trap vector.
    assert_eq!(runner.hart.privilege(), PrivilegeMode::Machine);
    assert_eq!(runner.hart.regs.pc(), 0x5000);
    assert_eq!(runner.hart.csr.cause[PrivilegeMode::Machine.idx()], 0);
}

#[test]
fn test_userland_records_trap_value_at_user_level() {
    let hart = bare_hart();
    let engine = TrapOnceEngine::new(Exception::LoadFault, 0xcafe);
    let mut runner = HartRunner::new(hart, Box::new(engine));

    let cause = runner.run_userland();

    assert_eq!(cause, 0x5);
    assert_eq!(runner.hart.csr.tval[PrivilegeMode::User.idx()], 0xcafe);
}
