//! Interconnect and System Tests.
//!
//! Verifies that the built system maps every configured device and that bus-error
//! unit outputs reach the APLIC and the hart line.

use aplic_core::config::Config;
use aplic_core::drivers::aplic::regs;
use aplic_core::drivers::beu::{ACCRUED_OFFSET, PLATFORM_INTERRUPT_OFFSET};
use aplic_core::hal::RegisterAccess;
use aplic_core::soc::System;

const APLIC: u64 = 0x0C00_0000;
const BEU1: u64 = 0x0170_1000;

#[test]
fn system_maps_configured_devices() {
    let system = System::new(&Config::default());
    let bus = system.bus();
    let names = bus.device_names();
    assert!(names.contains(&"APLIC"));
    assert!(names.contains(&"CLINT"));
    assert!(names.contains(&"BEU0"));
    assert!(names.contains(&"BEU1"));
}

#[test]
fn domaincfg_reads_back_through_system() {
    let system = System::new(&Config::default());
    assert_eq!(system.read_u32(APLIC + regs::DOMAINCFG), 0x8000_0000);
    system.write_u32(APLIC + regs::DOMAINCFG, regs::DOMAINCFG_IE);
    assert_eq!(system.read_u32(APLIC + regs::DOMAINCFG), 0x8000_0100);
}

#[test]
fn bus_error_raises_external_line() {
    let system = System::new(&Config::default());
    system.write_u32(APLIC + regs::DOMAINCFG, regs::DOMAINCFG_IE);
    system.write_u32(APLIC + 0x4000 + regs::IDELIVERY, 1);
    system.write_u32(APLIC + regs::sourcecfg(131), 4);
    system.write_u32(APLIC + regs::target(131), 1);
    system.write_u32(APLIC + regs::SETIENUM, 131);

    system.write_u32(BEU1 + PLATFORM_INTERRUPT_OFFSET, 0x40);
    system.write_u32(BEU1 + ACCRUED_OFFSET, 0x40);
    assert!(!system.lines(0).meip);
    system.tick();
    assert!(system.lines(0).meip);

    assert_eq!(system.read_u32(APLIC + 0x4000 + regs::CLAIMI), (131 << 16) | 1);
    assert!(!system.lines(0).meip);
}

#[test]
fn unmapped_reads_are_zero() {
    let system = System::new(&Config::default());
    assert_eq!(system.read_u64(0x9000_0000), 0);
}
