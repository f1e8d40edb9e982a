//! APLIC Source Configuration Tests.
//!
//! Verifies that configuration rejects bad ids and modes before touching any
//! register, writes sourcecfg, target, and setienum in that order, verifies the
//! enable bit, and is idempotent.

use std::sync::Arc;

use aplic_core::common::AplicError;
use aplic_core::drivers::aplic::regs;
use aplic_core::drivers::{Aplic, Privilege, TriggerMode};
use aplic_core::hal::RegisterAccess;
use proptest::prelude::*;
use rstest::rstest;

use crate::common::harness::TestContext;
use crate::common::mocks::mmio::{MockMmio, RecordingMmio};

const BASE: u64 = 0x0C00_0000;
const SOURCES: u32 = 139;

fn silent_mock() -> MockMmio {
    let mut mmio = MockMmio::new();
    let _ = mmio.expect_write_u32().never();
    let _ = mmio.expect_write_u64().never();
    let _ = mmio.expect_read_u32().never();
    mmio
}

#[test]
fn id_zero_rejected_without_writes() {
    let aplic = Aplic::new(silent_mock(), BASE, 0x4000, SOURCES, 1);
    let err = aplic
        .configure_source(0, 0, TriggerMode::RisingEdge, 1, Privilege::Machine)
        .unwrap_err();
    assert_eq!(err, AplicError::InvalidSourceId { id: 0, max: SOURCES });
}

#[test]
fn unknown_hart_rejected_without_writes() {
    let aplic = Aplic::new(silent_mock(), BASE, 0x4000, SOURCES, 1);
    let err = aplic
        .configure_source(3, 5, TriggerMode::RisingEdge, 1, Privilege::Machine)
        .unwrap_err();
    assert_eq!(err, AplicError::InvalidHart { hart: 3, count: 1 });
}

#[rstest]
#[case(2)]
#[case(3)]
#[case(8)]
#[case(0xFFFF_FFFF)]
fn reserved_modes_rejected_without_writes(#[case] raw: u32) {
    let aplic = Aplic::new(silent_mock(), BASE, 0x4000, SOURCES, 1);
    let err = aplic
        .configure_source_raw(0, 5, raw, 1, Privilege::Machine)
        .unwrap_err();
    assert_eq!(err, AplicError::InvalidTriggerMode(raw));
}

proptest! {
    #[test]
    fn out_of_range_ids_never_write(id in (SOURCES + 1)..=u32::MAX, prio in any::<u8>()) {
        let aplic = Aplic::new(silent_mock(), BASE, 0x4000, SOURCES, 1);
        let result = aplic.configure_source(0, id, TriggerMode::LevelHigh, prio, Privilege::Machine);
        prop_assert_eq!(result, Err(AplicError::InvalidSourceId { id, max: SOURCES }));
    }
}

#[test]
fn writes_sourcecfg_then_target_then_setienum() {
    let mmio = Arc::new(RecordingMmio::new());
    // Source 40 lives in word 1, bit 7 of the enable bitmap.
    mmio.preset(BASE + regs::SETIE_BASE + 4, 1 << 7);
    let aplic = Aplic::new(Arc::clone(&mmio), BASE, 0x4000, SOURCES, 2);

    aplic
        .configure_source(1, 40, TriggerMode::FallingEdge, 3, Privilege::Machine)
        .unwrap();

    assert_eq!(
        mmio.writes(),
        vec![
            (BASE + regs::sourcecfg(40), 5),
            (BASE + regs::target(40), (1 << 18) | 3),
            (BASE + regs::SETIENUM, 40),
        ]
    );
}

#[test]
fn missing_enable_bit_reported() {
    let mmio = Arc::new(RecordingMmio::new());
    let aplic = Aplic::new(Arc::clone(&mmio), BASE, 0x4000, SOURCES, 1);
    let err = aplic
        .configure_source(0, 9, TriggerMode::RisingEdge, 1, Privilege::Machine)
        .unwrap_err();
    assert_eq!(err, AplicError::EnableVerificationFailed(9));
}

#[rstest]
#[case(TriggerMode::Detached)]
#[case(TriggerMode::RisingEdge)]
#[case(TriggerMode::FallingEdge)]
#[case(TriggerMode::LevelHigh)]
#[case(TriggerMode::LevelLow)]
fn configured_source_is_enabled_and_idempotent(#[case] mode: TriggerMode) {
    let ctx = TestContext::new();
    let aplic = ctx.aplic();
    let bus = ctx.sim.system();
    let base = ctx.sim.config().platform.aplic_base;
    let snapshot = || {
        (
            bus.read_u32(base + regs::sourcecfg(17)),
            bus.read_u32(base + regs::target(17)),
            aplic.is_pending(17),
            aplic.is_enabled(17),
        )
    };

    aplic.configure_source(0, 17, mode, 4, Privilege::Machine).unwrap();
    let once = snapshot();
    assert_eq!(once.1, 4, "hart 0, priority 4");
    assert!(once.3);

    aplic.configure_source(0, 17, mode, 4, Privilege::Machine).unwrap();
    assert_eq!(snapshot(), once);
    assert!(!aplic.is_enabled(16));
    assert!(!aplic.is_enabled(18));
}

#[test]
fn reconfiguring_keeps_target_hart_and_pending_state() {
    let ctx = TestContext::with_config(|c| c.platform.num_harts = 2);
    let aplic = ctx.aplic();
    let bus = ctx.sim.system();
    let base = ctx.sim.config().platform.aplic_base;

    aplic
        .configure_source(1, 23, TriggerMode::Detached, 6, Privilege::Machine)
        .unwrap();
    aplic.set_pending_by_number(23).unwrap();
    assert!(aplic.is_pending(23));

    aplic
        .configure_source(1, 23, TriggerMode::Detached, 6, Privilege::Machine)
        .unwrap();
    assert_eq!(
        bus.read_u32(base + regs::target(23)),
        (1 << regs::TARGET_HART_SHIFT) | 6
    );
    assert!(aplic.is_pending(23));
    assert!(aplic.is_enabled(23));
}

#[test]
fn inactive_source_cannot_be_enabled() {
    let ctx = TestContext::new();
    let err = ctx
        .aplic()
        .configure_source(0, 17, TriggerMode::Inactive, 4, Privilege::Machine)
        .unwrap_err();
    assert_eq!(err, AplicError::EnableVerificationFailed(17));
}

#[test]
fn delegated_source_cannot_be_enabled() {
    let ctx = TestContext::new();
    let aplic = ctx.aplic();
    let err = aplic
        .configure_source(0, 17, TriggerMode::RisingEdge, 4, Privilege::Supervisor)
        .unwrap_err();
    assert_eq!(err, AplicError::EnableVerificationFailed(17));
    assert!(!aplic.is_enabled(17));
}

#[test]
fn disable_source_clears_enable() {
    let ctx = TestContext::new();
    let aplic = ctx.aplic();
    aplic.configure_source(0, 64, TriggerMode::RisingEdge, 1, Privilege::Machine).unwrap();
    aplic.disable_source(64).unwrap();
    assert!(!aplic.is_enabled(64));
}

#[test]
fn invalid_ids_are_never_enabled_or_pending() {
    let ctx = TestContext::new();
    let aplic = ctx.aplic();
    for id in [0, 140, u32::MAX] {
        assert!(!aplic.is_enabled(id));
        assert!(!aplic.is_pending(id));
    }
}
