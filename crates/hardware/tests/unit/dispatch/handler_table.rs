//! Handler Table Tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use aplic_core::common::AplicError;
use aplic_core::dispatch::HandlerTable;

#[test]
fn every_slot_dispatches() {
    let table = HandlerTable::new(139);
    assert_eq!(table.num_sources(), 139);
    assert!(table.dispatch(0));
    assert!(table.dispatch(139));
    assert!(!table.dispatch(140));
}

#[test]
fn installed_closure_runs() {
    let table = HandlerTable::new(32);
    let hits = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&hits);
    table
        .install_fn(5, move || counter.store(counter.load(Ordering::SeqCst) + 1, Ordering::SeqCst))
        .unwrap();

    assert!(table.dispatch(5));
    assert!(table.dispatch(5));
    assert_eq!(hits.load(Ordering::SeqCst), 2);

    table.default_all();
    assert!(table.dispatch(5));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[test]
fn install_out_of_range_rejected() {
    let table = HandlerTable::new(32);
    assert_eq!(
        table.install_fn(33, || {}),
        Err(AplicError::InvalidSourceId { id: 33, max: 32 })
    );
}
