//! CLINT Driver Tests.

use std::sync::Arc;

use aplic_core::drivers::Clint;
use aplic_core::drivers::clint::{MSIP_OFFSET, MTIMECMP_OFFSET};

use crate::common::harness::TestContext;
use crate::common::mocks::mmio::RecordingMmio;

#[test]
fn per_hart_register_addresses() {
    let mmio = Arc::new(RecordingMmio::new());
    let clint = Clint::new(Arc::clone(&mmio), 0x0200_0000);
    clint.trigger_software(2);
    clint.set_timecmp(3, 99);
    assert_eq!(
        mmio.writes(),
        vec![
            (0x0200_0000 + MSIP_OFFSET + 8, 1),
            (0x0200_0000 + MTIMECMP_OFFSET + 24, 99),
        ]
    );
}

#[test]
fn software_interrupt_round_trip_on_platform() {
    let ctx = TestContext::new();
    let clint = ctx.clint();
    assert!(!clint.software_pending(0));
    clint.trigger_software(0);
    assert!(clint.software_pending(0));
    clint.clear_software(0);
    assert!(!clint.software_pending(0));
}

#[test]
fn mtime_advances_with_platform_ticks() {
    let ctx = TestContext::new();
    let clint = ctx.clint();
    let before = clint.mtime();
    for _ in 0..10 {
        ctx.sim.system().tick();
    }
    assert_eq!(clint.mtime(), before + 10);
    assert_eq!(clint.timecmp(0), u64::MAX);
}
