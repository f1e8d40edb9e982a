//! Core Local Interruptor (CLINT).
//!
//! The CLINT block holds memory-mapped control and status registers associated
//! with software and timer interrupts, one MSIP and one MTIMECMP per hart and a
//! single shared MTIME.
//!
//! # Memory Map
//!
//! * `0x0000 + 4 * hart`: MSIP (Machine Software Interrupt Pending)
//! * `0x4000 + 8 * hart`: MTIMECMP (Machine Time Compare)
//! * `0xBFF8`: MTIME (Machine Time)

use crate::drivers::clint::{MSIP_OFFSET, MTIME_OFFSET, MTIMECMP_OFFSET};
use crate::soc::devices::Device;

/// Size of the CLINT register window.
const WINDOW_SIZE: u64 = 0x10000;

/// CLINT device structure.
#[derive(Debug, Clone)]
pub struct ClintDevice {
    /// Base physical address of the device.
    base_addr: u64,
    /// Current machine time counter.
    mtime: u64,
    /// Machine time compare register, per hart.
    mtimecmp: Vec<u64>,
    /// Machine software interrupt pending register, per hart.
    msip: Vec<u32>,
    /// Divider to scale bus ticks to timer ticks.
    divider: u64,
    /// Internal counter for the divider.
    counter: u64,
}

impl ClintDevice {
    /// Creates a new CLINT device.
    ///
    /// # Arguments
    ///
    /// * `base_addr` - The base physical address.
    /// * `divider` - The ratio of bus ticks to timer ticks (e.g., 10 means the timer increments every 10 ticks).
    /// * `num_harts` - Number of harts with an MSIP and MTIMECMP register.
    pub fn new(base_addr: u64, divider: u64, num_harts: usize) -> Self {
        Self {
            base_addr,
            mtime: 0,
            mtimecmp: vec![u64::MAX; num_harts],
            msip: vec![0; num_harts],
            divider: divider.max(1),
            counter: 0,
        }
    }

    /// Returns `true` while `hart`'s MSIP bit is set.
    pub fn software_pending(&self, hart: usize) -> bool {
        self.msip.get(hart).is_some_and(|m| m & 1 != 0)
    }

    /// Returns `true` once MTIME has reached `hart`'s MTIMECMP.
    pub fn timer_pending(&self, hart: usize) -> bool {
        self.mtimecmp.get(hart).is_some_and(|&cmp| self.mtime >= cmp)
    }

    /// Current machine time.
    pub const fn mtime(&self) -> u64 {
        self.mtime
    }

    fn msip_slot(&self, offset: u64) -> Option<usize> {
        let rel = offset.checked_sub(MSIP_OFFSET)?;
        let hart = (rel / 4) as usize;
        (rel % 4 == 0 && hart < self.msip.len()).then_some(hart)
    }

    /// Hart and half (0 = low word, 1 = high word) addressed by an MTIMECMP offset.
    fn mtimecmp_slot(&self, offset: u64) -> Option<(usize, u64)> {
        let rel = offset.checked_sub(MTIMECMP_OFFSET)?;
        let hart = (rel / 8) as usize;
        (rel % 4 == 0 && hart < self.mtimecmp.len()).then_some((hart, (rel % 8) / 4))
    }

    const fn merge_half(old: u64, half: u64, val: u32) -> u64 {
        if half == 0 {
            (old & 0xFFFF_FFFF_0000_0000) | val as u64
        } else {
            (old & 0x0000_0000_FFFF_FFFF) | ((val as u64) << 32)
        }
    }
}

impl Device for ClintDevice {
    fn name(&self) -> &str {
        "CLINT"
    }

    fn address_range(&self) -> (u64, u64) {
        (self.base_addr, WINDOW_SIZE)
    }

    /// Reads a byte from the device.
    ///
    /// Delegates to `read_u32` and extracts the appropriate byte.
    fn read_u8(&mut self, offset: u64) -> u8 {
        let val = self.read_u32(offset & !3);
        ((val >> ((offset & 3) * 8)) & 0xFF) as u8
    }

    /// Reads a half-word (unimplemented, returns 0).
    fn read_u16(&mut self, _offset: u64) -> u16 {
        0
    }

    /// Handles reads to MSIP, and the lower/upper halves of MTIME and MTIMECMP.
    fn read_u32(&mut self, offset: u64) -> u32 {
        if offset == MTIME_OFFSET {
            return self.mtime as u32;
        }
        if offset == MTIME_OFFSET + 4 {
            return (self.mtime >> 32) as u32;
        }
        if let Some(hart) = self.msip_slot(offset) {
            return self.msip[hart];
        }
        match self.mtimecmp_slot(offset) {
            Some((hart, 0)) => self.mtimecmp[hart] as u32,
            Some((hart, _)) => (self.mtimecmp[hart] >> 32) as u32,
            None => 0,
        }
    }

    fn read_u64(&mut self, offset: u64) -> u64 {
        if offset == MTIME_OFFSET {
            return self.mtime;
        }
        match self.mtimecmp_slot(offset) {
            Some((hart, 0)) => self.mtimecmp[hart],
            _ => u64::from(self.read_u32(offset)),
        }
    }

    /// Writes a byte (unimplemented).
    fn write_u8(&mut self, _offset: u64, _val: u8) {}
    /// Writes a half-word (unimplemented).
    fn write_u16(&mut self, _offset: u64, _val: u16) {}

    fn write_u32(&mut self, offset: u64, val: u32) {
        if offset == MTIME_OFFSET || offset == MTIME_OFFSET + 4 {
            self.mtime = Self::merge_half(self.mtime, (offset - MTIME_OFFSET) / 4, val);
        } else if let Some(hart) = self.msip_slot(offset) {
            self.msip[hart] = val & 1;
        } else if let Some((hart, half)) = self.mtimecmp_slot(offset) {
            self.mtimecmp[hart] = Self::merge_half(self.mtimecmp[hart], half, val);
        }
    }

    fn write_u64(&mut self, offset: u64, val: u64) {
        if offset == MTIME_OFFSET {
            self.mtime = val;
            return;
        }
        match self.mtimecmp_slot(offset) {
            Some((hart, 0)) => self.mtimecmp[hart] = val,
            _ => self.write_u32(offset, val as u32),
        }
    }

    /// Advances the device state by one bus tick.
    ///
    /// Increments `mtime` every `divider` ticks. The CLINT drives hart-local
    /// lines rather than an APLIC source, so this never reports an output.
    fn tick(&mut self) -> bool {
        self.counter += 1;
        if self.counter >= self.divider {
            self.mtime = self.mtime.wrapping_add(1);
            self.counter = 0;
        }
        false
    }

    fn as_clint_mut(&mut self) -> Option<&mut ClintDevice> {
        Some(self)
    }
}
