//! Bus-error unit (BEU) driver and the bus-error-to-interrupt bridge.
//!
//! Each core complex has a bus-error unit that records cache, TLB, and bus errors.
//! The bridge arms every unit so that the selected error classes raise the unit's
//! platform interrupt, which is wired 1:1 to an APLIC source.
//!
//! # Memory Map
//!
//! * `0x00`: CAUSE (first error class recorded)
//! * `0x08`: VALUE (physical address of the error)
//! * `0x10`: ENABLE (classes recorded at all)
//! * `0x18`: PLATFORM_INTERRUPT (classes routed to the platform interrupt)
//! * `0x20`: ACCRUED (classes seen since last cleared)
//! * `0x28`: LOCAL_INTERRUPT (classes routed to the hart-local interrupt)

use std::sync::Arc;

use bitflags::bitflags;
use tracing::{debug, info};

use crate::config::BusErrorConfig;
use crate::dispatch::{Counter, HandlerTable, HartCounters, InterruptHandler};
use crate::hal::RegisterAccess;

/// Offset of the CAUSE register.
pub const CAUSE_OFFSET: u64 = 0x00;
/// Offset of the VALUE register.
pub const VALUE_OFFSET: u64 = 0x08;
/// Offset of the ENABLE register.
pub const ENABLE_OFFSET: u64 = 0x10;
/// Offset of the PLATFORM_INTERRUPT register.
pub const PLATFORM_INTERRUPT_OFFSET: u64 = 0x18;
/// Offset of the ACCRUED register.
pub const ACCRUED_OFFSET: u64 = 0x20;
/// Offset of the LOCAL_INTERRUPT register.
pub const LOCAL_INTERRUPT_OFFSET: u64 = 0x28;
/// Size of one unit's register window.
pub const WINDOW_SIZE: u64 = 0x1000;

bitflags! {
    /// Error classes recorded by a bus-error unit.
    ///
    /// The same bit layout is used by ENABLE, PLATFORM_INTERRUPT, ACCRUED, and
    /// LOCAL_INTERRUPT.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ErrorClass: u32 {
        /// Instruction cache TileLink bus error.
        const ICACHE_TL_BUS_ERROR       = 1 << 1;
        /// Instruction cache or ITIM correctable ECC error.
        const ICACHE_ITIM_CORRECTABLE   = 1 << 2;
        /// Instruction cache uncorrectable ECC error.
        const ICACHE_UNCORRECTABLE      = 1 << 3;
        /// Load, store, or page-table-walk bus error.
        const LOAD_STORE_PTW_BUS_ERROR  = 1 << 5;
        /// Data cache correctable ECC error.
        const DCACHE_CORRECTABLE        = 1 << 6;
        /// Data cache uncorrectable ECC error.
        const DCACHE_UNCORRECTABLE      = 1 << 7;
        /// Micro-TLB parity error.
        const UTLB_PARITY               = 1 << 8;
        /// L2 private bus error.
        const L2_PRIVATE_BUS_ERROR      = 1 << 9;
        /// L2 correctable ECC error.
        const L2_CORRECTABLE            = 1 << 10;
        /// L2 uncorrectable ECC error.
        const L2_UNCORRECTABLE          = 1 << 11;
    }
}

/// Driver for one bus-error unit.
#[derive(Debug, Clone)]
pub struct BusErrorUnit<R> {
    mmio: R,
    base: u64,
    source_id: u32,
}

impl<R: RegisterAccess> BusErrorUnit<R> {
    /// Creates a driver for the unit at `base` whose platform interrupt drives APLIC source `source_id`.
    pub const fn new(mmio: R, base: u64, source_id: u32) -> Self {
        Self {
            mmio,
            base,
            source_id,
        }
    }

    /// APLIC source driven by this unit.
    pub const fn source_id(&self) -> u32 {
        self.source_id
    }

    /// MMIO base address.
    pub const fn base(&self) -> u64 {
        self.base
    }

    /// Routes `classes` to the platform interrupt and nothing to the local one.
    ///
    /// Clears ACCRUED first so a stale error cannot fire the interrupt as soon as
    /// it is routed.
    pub fn arm(&self, classes: ErrorClass) {
        self.mmio.write_u32(self.base + ACCRUED_OFFSET, 0);
        self.mmio.write_u32(self.base + ENABLE_OFFSET, classes.bits());
        self.mmio.write_u32(self.base + LOCAL_INTERRUPT_OFFSET, 0);
        self.mmio.write_u32(self.base + PLATFORM_INTERRUPT_OFFSET, classes.bits());
    }

    /// Writes ACCRUED directly, as if the unit had just recorded `mask`.
    pub fn simulate(&self, mask: u32) {
        self.mmio.write_u32(self.base + ACCRUED_OFFSET, mask);
    }

    /// Reads ACCRUED.
    pub fn accrued(&self) -> u32 {
        self.mmio.read_u32(self.base + ACCRUED_OFFSET)
    }

    /// Reads ACCRUED and clears it, returning the value read.
    pub fn take_accrued(&self) -> u32 {
        let value = self.accrued();
        self.mmio.write_u32(self.base + ACCRUED_OFFSET, 0);
        value
    }

    /// Reads CAUSE.
    pub fn cause(&self) -> u32 {
        self.mmio.read_u32(self.base + CAUSE_OFFSET)
    }

    /// Reads VALUE.
    pub fn value(&self) -> u64 {
        self.mmio.read_u64(self.base + VALUE_OFFSET)
    }
}

/// Interrupt handler for one unit: captures ACCRUED into the hart's counters and clears it.
#[derive(Debug)]
pub struct BusErrorHandler<R> {
    unit: BusErrorUnit<R>,
    counters: Arc<HartCounters>,
}

impl<R: RegisterAccess> InterruptHandler for BusErrorHandler<R> {
    fn handle(&self) {
        let accrued = self.unit.take_accrued();
        self.counters.store(Counter::BusErrorValue, accrued);
        debug!(
            source = self.unit.source_id(),
            accrued = format_args!("{accrued:#x}"),
            "bus error captured"
        );
    }
}

/// The set of bus-error units on the platform and their APLIC wiring.
#[derive(Debug, Clone)]
pub struct BusErrorBridge<R> {
    units: Vec<BusErrorUnit<R>>,
}

impl<R: RegisterAccess + Clone> BusErrorBridge<R> {
    /// Creates drivers for every unit listed in `config`.
    pub fn from_config(mmio: &R, config: &BusErrorConfig) -> Self {
        Self {
            units: config
                .units
                .iter()
                .map(|u| BusErrorUnit::new(mmio.clone(), u.base, u.source_id))
                .collect(),
        }
    }

    /// Units on the platform, in configuration order.
    pub fn units(&self) -> &[BusErrorUnit<R>] {
        &self.units
    }

    /// Returns `true` if the platform has no bus-error units.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Unit owned by `hart`, falling back to the first unit.
    pub fn unit_for_hart(&self, hart: usize) -> Option<&BusErrorUnit<R>> {
        self.units.get(hart).or_else(|| self.units.first())
    }

    /// Arms every unit for `classes`.
    pub fn arm(&self, classes: ErrorClass) {
        for unit in &self.units {
            unit.arm(classes);
        }
        info!(
            units = self.units.len(),
            classes = format_args!("{:#x}", classes.bits()),
            "bus-error units armed"
        );
    }

    /// Injects an error into unit `index`. Returns `false` if there is no such unit.
    pub fn simulate(&self, index: usize, mask: u32) -> bool {
        self.units.get(index).is_some_and(|unit| {
            unit.simulate(mask);
            true
        })
    }

    /// Installs a capture handler for every unit's source.
    pub fn install_handlers(
        &self,
        table: &HandlerTable,
        counters: &Arc<HartCounters>,
    ) -> Result<(), crate::common::AplicError>
    where
        R: 'static,
    {
        for unit in &self.units {
            table.install(
                unit.source_id(),
                Arc::new(BusErrorHandler {
                    unit: unit.clone(),
                    counters: Arc::clone(counters),
                }),
            )?;
        }
        Ok(())
    }
}
