//! Boot Barrier Tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use aplic_core::arch::csr;
use aplic_core::hal::Hart;
use aplic_core::sequencer::{BootBarrier, park_secondary};

use crate::common::mocks::hart::FakeHart;

#[test]
fn aborted_wait_reports_false() {
    let barrier = BootBarrier::new();
    let abort = AtomicBool::new(true);
    assert!(!barrier.wait(&FakeHart::new(1), &abort).unwrap());
}

#[test]
fn released_barrier_passes_immediately() {
    let barrier = BootBarrier::new();
    barrier.release();
    let hart = FakeHart::new(1);
    assert!(barrier.wait(&hart, &AtomicBool::new(false)).unwrap());
    assert_eq!(hart.relaxes(), 0);
}

#[test]
fn parked_hart_enables_external_interrupts_until_shutdown() {
    let barrier = BootBarrier::new();
    barrier.release();
    let shutdown = Arc::new(AtomicBool::new(false));
    let trigger = Arc::clone(&shutdown);
    let hart = FakeHart::new(1).with_hook(move |step| {
        if step == 5 {
            trigger.store(true, Ordering::SeqCst);
        }
        Ok(())
    });

    park_secondary(&hart, &barrier, &shutdown).unwrap();
    assert_eq!(hart.relaxes(), 5);
    assert_eq!(hart.read_csr(csr::MIE) & csr::MIE_MEIP, csr::MIE_MEIP);
    assert_eq!(hart.read_csr(csr::MSTATUS) & csr::MSTATUS_MIE, csr::MSTATUS_MIE);
}

#[test]
fn secondary_waits_for_release() {
    let barrier = BootBarrier::new();
    let shutdown = AtomicBool::new(false);
    let hart = FakeHart::new(1);

    thread::scope(|s| {
        let parked = s.spawn(|| park_secondary(&hart, &barrier, &shutdown));
        while hart.relaxes() < 10 {
            thread::yield_now();
        }
        assert_eq!(hart.read_csr(csr::MIE), 0);
        barrier.release();
        shutdown.store(true, Ordering::SeqCst);
        parked.join().unwrap().unwrap();
    });
}
