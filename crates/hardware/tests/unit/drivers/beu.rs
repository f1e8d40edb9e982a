//! Bus-Error Unit Driver Tests.
//!
//! Verifies the arming sequence, handler capture, and the bridge's unit lookup.

use std::sync::Arc;

use aplic_core::config::{BusErrorConfig, BusErrorUnitConfig};
use aplic_core::dispatch::{Counter, HandlerTable, HartCounters};
use aplic_core::drivers::beu::{
    ACCRUED_OFFSET, ENABLE_OFFSET, LOCAL_INTERRUPT_OFFSET, PLATFORM_INTERRUPT_OFFSET,
};
use aplic_core::drivers::{BusErrorBridge, BusErrorUnit, ErrorClass};

use crate::common::mocks::mmio::RecordingMmio;

const BASE: u64 = 0x0170_0000;

fn config(units: usize) -> BusErrorConfig {
    BusErrorConfig {
        units: (0..units)
            .map(|i| BusErrorUnitConfig {
                base: BASE + 0x1000 * i as u64,
                source_id: 130 + i as u32,
            })
            .collect(),
        ..BusErrorConfig::default()
    }
}

#[test]
fn arm_clears_accrued_before_routing() {
    let mmio = Arc::new(RecordingMmio::new());
    let unit = BusErrorUnit::new(Arc::clone(&mmio), BASE, 130);
    let classes = ErrorClass::DCACHE_CORRECTABLE | ErrorClass::ICACHE_ITIM_CORRECTABLE;
    unit.arm(classes);

    assert_eq!(
        mmio.writes(),
        vec![
            (BASE + ACCRUED_OFFSET, 0),
            (BASE + ENABLE_OFFSET, 0x44),
            (BASE + LOCAL_INTERRUPT_OFFSET, 0),
            (BASE + PLATFORM_INTERRUPT_OFFSET, 0x44),
        ]
    );
}

#[test]
fn take_accrued_reads_then_clears() {
    let mmio = Arc::new(RecordingMmio::new());
    mmio.preset(BASE + ACCRUED_OFFSET, 0x40);
    let unit = BusErrorUnit::new(Arc::clone(&mmio), BASE, 130);
    assert_eq!(unit.take_accrued(), 0x40);
    assert_eq!(unit.accrued(), 0);
}

#[test]
fn handler_stores_accrued_in_counters() {
    let mmio = Arc::new(RecordingMmio::new());
    let bridge = BusErrorBridge::from_config(&mmio, &config(2));
    let table = HandlerTable::new(139);
    let counters = Arc::new(HartCounters::new());
    bridge.install_handlers(&table, &counters).unwrap();

    mmio.preset(BASE + 0x1000 + ACCRUED_OFFSET, 0x40);
    assert!(table.dispatch(131));
    assert_eq!(counters.get(Counter::BusErrorValue), 0x40);
    assert_eq!(mmio.value(BASE + 0x1000 + ACCRUED_OFFSET), 0);
}

#[test]
fn unit_lookup_falls_back_to_first() {
    let mmio = Arc::new(RecordingMmio::new());
    let bridge = BusErrorBridge::from_config(&mmio, &config(2));
    assert_eq!(bridge.unit_for_hart(1).unwrap().source_id(), 131);
    assert_eq!(bridge.unit_for_hart(7).unwrap().source_id(), 130);
    assert!(!bridge.simulate(2, 0x40));
    assert!(bridge.simulate(0, 0x40));
    assert_eq!(mmio.value(BASE + ACCRUED_OFFSET), 0x40);
}

#[test]
fn empty_bridge_has_no_units() {
    let mmio = Arc::new(RecordingMmio::new());
    let bridge = BusErrorBridge::from_config(&mmio, &config(0));
    assert!(bridge.is_empty());
    assert!(bridge.unit_for_hart(0).is_none());
}
