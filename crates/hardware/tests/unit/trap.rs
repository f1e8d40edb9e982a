//! Trap Vector Tests.
//!
//! Drives `TrapVector::on_trap` directly with a fake hart whose `mcause` is
//! preset, against the simulated platform.

use std::sync::Arc;

use aplic_core::arch::{cause, csr};
use aplic_core::common::FatalTrap;
use aplic_core::dispatch::{ClaimEngine, Counter, CounterBank};
use aplic_core::drivers::{Privilege, TriggerMode};
use aplic_core::hal::TrapEntry;
use aplic_core::sim::SimBus;
use aplic_core::trap::{TIMER_PARK_DELTA, TrapVector};

use crate::common::harness::TestContext;
use crate::common::mocks::hart::FakeHart;

fn vector(ctx: &TestContext, max_repeats: u32) -> (TrapVector<SimBus>, CounterBank) {
    let counters = CounterBank::new(1);
    let engine = ClaimEngine::new(ctx.aplic(), Arc::clone(ctx.sim.table()), max_repeats);
    (TrapVector::new(engine, ctx.clint(), counters.clone()), counters)
}

fn hart_with_cause(mcause: u64) -> FakeHart {
    let hart = FakeHart::new(0);
    hart.set(csr::MCAUSE, mcause);
    hart
}

#[test]
fn software_trap_counts_and_clears_msip() {
    let ctx = TestContext::new();
    let (vector, counters) = vector(&ctx, 16);
    ctx.clint().trigger_software(0);

    vector
        .on_trap(&hart_with_cause(cause::interrupt::MACHINE_SOFTWARE))
        .unwrap();
    assert_eq!(counters.hart(0).unwrap().get(Counter::Software), 1);
    assert!(!ctx.clint().software_pending(0));
}

#[test]
fn timer_trap_parks_compare() {
    let ctx = TestContext::new();
    let (vector, counters) = vector(&ctx, 16);
    for _ in 0..3 {
        ctx.sim.system().tick();
    }
    let now = ctx.clint().mtime();

    vector
        .on_trap(&hart_with_cause(cause::interrupt::MACHINE_TIMER))
        .unwrap();
    assert_eq!(counters.hart(0).unwrap().get(Counter::Timer), 1);
    assert_eq!(ctx.clint().timecmp(0), now + TIMER_PARK_DELTA);
}

#[test]
fn external_trap_drains_and_counts_once() {
    let ctx = TestContext::new();
    let (vector, counters) = vector(&ctx, 16);
    let aplic = ctx.aplic();
    for id in [3, 4] {
        aplic.configure_source(0, id, TriggerMode::RisingEdge, 1, Privilege::Machine).unwrap();
        aplic.set_pending_by_number(id).unwrap();
    }

    vector
        .on_trap(&hart_with_cause(cause::interrupt::MACHINE_EXTERNAL))
        .unwrap();
    let counters = counters.hart(0).unwrap();
    assert_eq!(counters.get(Counter::External), 1);
    assert_eq!(counters.get(Counter::SpuriousClaim), 0);
    assert!(!aplic.is_pending(3));
    assert!(!aplic.is_pending(4));
}

#[test]
fn default_handler_drain_touches_only_the_external_counter() {
    let ctx = TestContext::new();
    let (vector, counters) = vector(&ctx, 16);
    let aplic = ctx.aplic();
    ctx.sim.table().default_all();
    aplic.configure_source(0, 12, TriggerMode::RisingEdge, 2, Privilege::Machine).unwrap();
    aplic.set_pending_by_number(12).unwrap();

    let counters = counters.hart(0).unwrap();
    counters.store(Counter::BusErrorValue, 0x40);
    counters.store(Counter::Software, 3);
    let before = counters.snapshot();

    vector
        .on_trap(&hart_with_cause(cause::interrupt::MACHINE_EXTERNAL))
        .unwrap();
    assert!(!aplic.is_pending(12));

    let after = counters.snapshot();
    for (counter, (old, new)) in Counter::ALL.iter().zip(before.iter().zip(after.iter())) {
        let expected = if *counter == Counter::External { old + 1 } else { *old };
        assert_eq!(*new, expected, "{counter:?}");
    }
}

#[test]
fn abandoned_drain_still_counts_once() {
    let ctx = TestContext::new();
    let (vector, counters) = vector(&ctx, 2);
    ctx.aplic()
        .configure_source(0, 60, TriggerMode::LevelLow, 1, Privilege::Machine)
        .unwrap();

    vector
        .on_trap(&hart_with_cause(cause::interrupt::MACHINE_EXTERNAL))
        .unwrap();
    let counters = counters.hart(0).unwrap();
    assert_eq!(counters.get(Counter::External), 1);
    assert_eq!(counters.get(Counter::RepeatedClaim), 3);
}

#[test]
fn unexpected_interrupt_is_fatal() {
    let ctx = TestContext::new();
    let (vector, _) = vector(&ctx, 16);
    let err = vector
        .on_trap(&hart_with_cause(cause::interrupt::SUPERVISOR_EXTERNAL))
        .unwrap_err();
    assert_eq!(err, FatalTrap::UnexpectedInterrupt(cause::interrupt::SUPERVISOR_EXTERNAL));
}

#[test]
fn exception_is_fatal_with_context() {
    let ctx = TestContext::new();
    let (vector, _) = vector(&ctx, 16);
    let hart = hart_with_cause(cause::exception::ILLEGAL_INSTRUCTION);
    hart.set(csr::MEPC, 0x8000_0010);
    hart.set(csr::MTVAL, 0x13);

    let err = vector.on_trap(&hart).unwrap_err();
    assert_eq!(
        err,
        FatalTrap::Exception { mcause: 2, mepc: 0x8000_0010, mtval: 0x13 }
    );
}

#[test]
fn unknown_hart_is_fatal() {
    let ctx = TestContext::new();
    let (vector, _) = vector(&ctx, 16);
    let hart = FakeHart::new(5);
    hart.set(csr::MCAUSE, cause::interrupt::MACHINE_SOFTWARE);
    assert_eq!(vector.on_trap(&hart).unwrap_err(), FatalTrap::UnknownHart(5));
}
