//! Claim Engine Tests.
//!
//! Drains the simulated controller and checks dispatch order, spurious claims,
//! interrupts queued by handlers, and the repeated-claim bound.

use std::sync::{Arc, Mutex};

use aplic_core::common::DispatchError;
use aplic_core::dispatch::{ClaimEngine, DrainReport};
use aplic_core::drivers::{Privilege, TriggerMode};
use aplic_core::sim::SimBus;
use pretty_assertions::assert_eq;

use crate::common::harness::TestContext;

fn engine(ctx: &TestContext, max_repeats: u32) -> ClaimEngine<SimBus> {
    ClaimEngine::new(ctx.aplic(), Arc::clone(ctx.sim.table()), max_repeats)
}

#[test]
fn empty_queue_drains_nothing_but_counts_spurious_claim() {
    let ctx = TestContext::new();
    let report = engine(&ctx, 16).drain(0).unwrap();
    assert_eq!(report, DrainReport { dispatched: vec![], spurious: 1, repeats: 0 });
}

#[test]
fn dispatches_in_priority_order() {
    let ctx = TestContext::new();
    let aplic = ctx.aplic();
    aplic.configure_source(0, 22, TriggerMode::RisingEdge, 2, Privilege::Machine).unwrap();
    aplic.configure_source(0, 23, TriggerMode::RisingEdge, 1, Privilege::Machine).unwrap();
    aplic.set_pending_by_number(22).unwrap();
    aplic.set_pending_by_number(23).unwrap();

    let report = engine(&ctx, 16).drain(0).unwrap();
    assert_eq!(report.dispatched, vec![23, 22]);
    assert_eq!(report.spurious, 0);
    assert!(!aplic.is_pending(22));
    assert!(!aplic.is_pending(23));
}

#[test]
fn handler_queued_interrupt_claimed_in_same_drain() {
    let ctx = TestContext::new();
    let aplic = ctx.aplic();
    aplic.configure_source(0, 40, TriggerMode::RisingEdge, 1, Privilege::Machine).unwrap();
    aplic.configure_source(0, 41, TriggerMode::RisingEdge, 1, Privilege::Machine).unwrap();

    let chained = ctx.aplic();
    ctx.sim
        .table()
        .install_fn(40, move || {
            chained.set_pending_by_number(41).unwrap();
        })
        .unwrap();
    aplic.set_pending_by_number(40).unwrap();

    let report = engine(&ctx, 16).drain(0).unwrap();
    assert_eq!(report.dispatched, vec![40, 41]);
    assert_eq!(report.repeats, 0);
}

#[test]
fn unquieted_level_source_is_bounded() {
    let ctx = TestContext::new();
    let aplic = ctx.aplic();
    // No device drives source 50, so an active-low level source is asserted forever.
    aplic.configure_source(0, 50, TriggerMode::LevelLow, 1, Privilege::Machine).unwrap();

    let err = engine(&ctx, 4).drain(0).unwrap_err();
    assert_eq!(err, DispatchError::RepeatedClaimSuspected { id: 50, repeats: 5 });
}

#[test]
fn forced_interrupt_is_spurious() {
    let ctx = TestContext::new();
    ctx.aplic().force(0).unwrap();
    let report = engine(&ctx, 16).drain(0).unwrap();
    assert_eq!(report.spurious, 1);
    assert!(report.dispatched.is_empty());
}

#[test]
fn dispatch_runs_installed_handler_once_per_claim() {
    let ctx = TestContext::new();
    let aplic = ctx.aplic();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    ctx.sim.table().install_fn(7, move || sink.lock().unwrap().push(7)).unwrap();
    aplic.configure_source(0, 7, TriggerMode::RisingEdge, 3, Privilege::Machine).unwrap();
    aplic.set_pending_by_number(7).unwrap();

    let report = engine(&ctx, 16).drain(0).unwrap();
    assert_eq!(report.dispatched, vec![7]);
    assert_eq!(*seen.lock().unwrap(), vec![7]);
}

#[test]
fn default_handler_reports_dispatch_without_side_effects() {
    let ctx = TestContext::new();
    let aplic = ctx.aplic();
    let counters = ctx.counters();
    let before = counters.snapshot();
    aplic.configure_source(0, 14, TriggerMode::RisingEdge, 5, Privilege::Machine).unwrap();
    aplic.set_pending_by_number(14).unwrap();

    let report = engine(&ctx, 16).drain(0).unwrap();
    assert_eq!(report, DrainReport { dispatched: vec![14], spurious: 0, repeats: 0 });
    assert_eq!(counters.snapshot(), before);
}
