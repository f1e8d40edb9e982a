//! System-on-Chip construction and top-level `System` type.
//!
//! This module builds the simulated platform from configuration. It performs:
//! 1. **Bus setup:** Creates the interconnect behind a lock shared by every hart thread.
//! 2. **Device registration:** Instantiates the APLIC, the CLINT, and one device per configured bus-error unit.
//! 3. **Register access:** Exposes the bus through [`RegisterAccess`] so drivers run unchanged against it.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::config::Config;
use crate::hal::RegisterAccess;
use crate::soc::devices::{AplicDevice, BusErrorUnitDevice, ClintDevice};
use crate::soc::interconnect::{Bus, IrqLines};

/// Top-level system instance: the interconnect and its devices.
#[derive(Debug)]
pub struct System {
    bus: Mutex<Bus>,
}

impl System {
    /// Builds a new system from configuration.
    pub fn new(config: &Config) -> Self {
        let platform = &config.platform;
        let mut bus = Bus::new();

        bus.add_device(Box::new(AplicDevice::new(
            platform.aplic_base,
            platform.aplic_idc_offset,
            platform.num_sources,
            platform.num_harts,
        )));
        bus.add_device(Box::new(ClintDevice::new(
            platform.clint_base,
            platform.clint_divider,
            platform.num_harts,
        )));
        for (index, unit) in config.bus_error.units.iter().enumerate() {
            bus.add_device(Box::new(BusErrorUnitDevice::new(index, unit.base, unit.source_id)));
        }
        debug!(devices = ?bus.device_names(), "system built");

        Self {
            bus: Mutex::new(bus),
        }
    }

    /// Locks the bus. A panic on another hart thread does not poison the platform.
    pub fn bus(&self) -> MutexGuard<'_, Bus> {
        self.bus.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Advances all devices by one tick.
    pub fn tick(&self) {
        self.bus().tick();
    }

    /// Current interrupt lines into `hart`.
    pub fn lines(&self, hart: usize) -> IrqLines {
        self.bus().lines(hart)
    }
}

impl RegisterAccess for System {
    fn read_u8(&self, addr: u64) -> u8 {
        self.bus().read_u8(addr)
    }

    fn read_u16(&self, addr: u64) -> u16 {
        self.bus().read_u16(addr)
    }

    fn read_u32(&self, addr: u64) -> u32 {
        self.bus().read_u32(addr)
    }

    fn read_u64(&self, addr: u64) -> u64 {
        self.bus().read_u64(addr)
    }

    fn write_u8(&self, addr: u64, val: u8) {
        self.bus().write_u8(addr, val);
    }

    fn write_u16(&self, addr: u64, val: u16) {
        self.bus().write_u16(addr, val);
    }

    fn write_u32(&self, addr: u64, val: u32) {
        self.bus().write_u32(addr, val);
    }

    fn write_u64(&self, addr: u64, val: u64) {
        self.bus().write_u64(addr, val);
    }
}
