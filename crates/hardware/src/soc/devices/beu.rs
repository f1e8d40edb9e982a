//! Bus-error unit (BEU).
//!
//! Records error classes in ACCRUED and raises its platform interrupt output while
//! any accrued class is also routed in PLATFORM_INTERRUPT. The output is wired to a
//! fixed APLIC source.

use crate::drivers::ErrorClass;
use crate::drivers::beu::{
    ACCRUED_OFFSET, CAUSE_OFFSET, ENABLE_OFFSET, LOCAL_INTERRUPT_OFFSET,
    PLATFORM_INTERRUPT_OFFSET, VALUE_OFFSET, WINDOW_SIZE,
};
use crate::soc::devices::Device;

/// Bus-error unit device structure.
#[derive(Debug, Clone)]
pub struct BusErrorUnitDevice {
    name: String,
    base_addr: u64,
    source_id: u32,
    cause: u32,
    value: u64,
    enable: u32,
    platform_mask: u32,
    accrued: u32,
    local_mask: u32,
}

impl BusErrorUnitDevice {
    /// Creates a unit at `base_addr` whose platform interrupt drives APLIC source `source_id`.
    pub fn new(index: usize, base_addr: u64, source_id: u32) -> Self {
        Self {
            name: format!("BEU{index}"),
            base_addr,
            source_id,
            cause: 0,
            value: 0,
            enable: 0,
            platform_mask: 0,
            accrued: 0,
            local_mask: 0,
        }
    }

    /// Records an error of `class` at physical address `addr`, as the hardware would.
    ///
    /// Classes not set in ENABLE are dropped. CAUSE and VALUE latch the first error
    /// until ACCRUED is cleared.
    pub fn inject(&mut self, class: ErrorClass, addr: u64) {
        let bits = class.bits() & self.enable;
        if bits == 0 {
            return;
        }
        if self.accrued == 0 {
            self.cause = bits.trailing_zeros();
            self.value = addr;
        }
        self.accrued |= bits;
    }

    /// Returns `true` while the platform interrupt output is high.
    pub const fn platform_interrupt(&self) -> bool {
        self.accrued & self.platform_mask != 0
    }
}

impl Device for BusErrorUnitDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn address_range(&self) -> (u64, u64) {
        (self.base_addr, WINDOW_SIZE)
    }

    fn read_u8(&mut self, offset: u64) -> u8 {
        (self.read_u64(offset & !7) >> ((offset & 7) * 8)) as u8
    }

    fn read_u16(&mut self, offset: u64) -> u16 {
        (self.read_u64(offset & !7) >> ((offset & 6) * 8)) as u16
    }

    fn read_u32(&mut self, offset: u64) -> u32 {
        if offset & 7 == 4 {
            return (self.read_u64(offset - 4) >> 32) as u32;
        }
        self.read_u64(offset) as u32
    }

    fn read_u64(&mut self, offset: u64) -> u64 {
        match offset {
            CAUSE_OFFSET => u64::from(self.cause),
            VALUE_OFFSET => self.value,
            ENABLE_OFFSET => u64::from(self.enable),
            PLATFORM_INTERRUPT_OFFSET => u64::from(self.platform_mask),
            ACCRUED_OFFSET => u64::from(self.accrued),
            LOCAL_INTERRUPT_OFFSET => u64::from(self.local_mask),
            _ => 0,
        }
    }

    fn write_u8(&mut self, _offset: u64, _val: u8) {}

    fn write_u16(&mut self, _offset: u64, _val: u16) {}

    fn write_u32(&mut self, offset: u64, val: u32) {
        match offset {
            CAUSE_OFFSET => self.cause = val,
            ENABLE_OFFSET => self.enable = val,
            PLATFORM_INTERRUPT_OFFSET => self.platform_mask = val,
            ACCRUED_OFFSET => self.accrued = val,
            LOCAL_INTERRUPT_OFFSET => self.local_mask = val,
            _ => {}
        }
    }

    fn write_u64(&mut self, offset: u64, val: u64) {
        if offset == VALUE_OFFSET {
            self.value = val;
        } else {
            self.write_u32(offset, val as u32);
        }
    }

    fn tick(&mut self) -> bool {
        self.platform_interrupt()
    }

    fn get_irq_id(&self) -> Option<u32> {
        Some(self.source_id)
    }
}
