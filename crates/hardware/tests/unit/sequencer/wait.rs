//! Bounded Wait Tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use aplic_core::common::FatalTrap;
use aplic_core::sequencer::{BoundedWait, WaitOutcome};

use mockall::Sequence;

use crate::common::mocks::hart::{FakeHart, MockScriptedHart};

#[test]
fn satisfied_condition_costs_no_steps() {
    let hart = FakeHart::new(0);
    let outcome = BoundedWait::new(10).spin_until(&hart, || true).unwrap();
    assert_eq!(outcome, WaitOutcome::Satisfied { spins: 0 });
    assert_eq!(hart.relaxes(), 0);
}

#[test]
fn condition_met_after_steps() {
    let flag = Arc::new(AtomicBool::new(false));
    let setter = Arc::clone(&flag);
    let hart = FakeHart::new(0).with_hook(move |step| {
        if step == 4 {
            setter.store(true, Ordering::SeqCst);
        }
        Ok(())
    });

    let outcome = BoundedWait::new(100)
        .spin_until(&hart, || flag.load(Ordering::SeqCst))
        .unwrap();
    assert_eq!(outcome, WaitOutcome::Satisfied { spins: 4 });
}

#[test]
fn budget_exhausted() {
    let hart = FakeHart::new(0);
    let outcome = BoundedWait::new(25).spin_until(&hart, || false).unwrap();
    assert_eq!(outcome, WaitOutcome::TimedOut);
    assert!(!outcome.is_satisfied());
    assert_eq!(hart.relaxes(), 25);
}

#[test]
fn settle_spends_whole_budget() {
    let hart = FakeHart::new(0);
    BoundedWait::new(7).settle(&hart).unwrap();
    assert_eq!(hart.relaxes(), 7);
}

#[test]
fn fatal_trap_stops_the_wait() {
    let hart = FakeHart::new(2).with_hook(|step| {
        if step == 3 {
            Err(FatalTrap::NoTrapVector(2))
        } else {
            Ok(())
        }
    });
    let err = BoundedWait::new(100).spin_until(&hart, || false).unwrap_err();
    assert_eq!(err, FatalTrap::NoTrapVector(2));
    assert_eq!(hart.relaxes(), 3);
}

#[test]
fn wait_touches_nothing_but_relax() {
    let mut hart = MockScriptedHart::new();
    let mut seq = Sequence::new();
    let _ = hart.expect_relax()
        .times(2)
        .in_sequence(&mut seq)
        .returning(|| Ok(()));
    let _ = hart.expect_relax()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Err(FatalTrap::UnexpectedInterrupt(9)));
    let _ = hart.expect_read_csr().never();
    let _ = hart.expect_write_csr().never();

    let err = BoundedWait::new(10).spin_until(&hart, || false).unwrap_err();
    assert_eq!(err, FatalTrap::UnexpectedInterrupt(9));
}
