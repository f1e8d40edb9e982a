//! Core Local Interruptor (CLINT) driver.
//!
//! # Memory Map
//!
//! * `0x0000 + 4 * hart`: MSIP (Machine Software Interrupt Pending)
//! * `0x4000 + 8 * hart`: MTIMECMP (Machine Time Compare)
//! * `0xBFF8`: MTIME (Machine Time)

use crate::hal::RegisterAccess;

/// Offset of hart 0's MSIP register.
pub const MSIP_OFFSET: u64 = 0x0000;
/// Offset of hart 0's MTIMECMP register.
pub const MTIMECMP_OFFSET: u64 = 0x4000;
/// Offset of the shared MTIME register.
pub const MTIME_OFFSET: u64 = 0xBFF8;

/// Driver for the CLINT software and timer interrupt block.
#[derive(Debug, Clone)]
pub struct Clint<R> {
    mmio: R,
    base: u64,
}

impl<R: RegisterAccess> Clint<R> {
    /// Creates a driver for a CLINT at `base`.
    pub const fn new(mmio: R, base: u64) -> Self {
        Self { mmio, base }
    }

    #[inline]
    const fn msip(&self, hart: usize) -> u64 {
        self.base + MSIP_OFFSET + 4 * hart as u64
    }

    #[inline]
    const fn mtimecmp(&self, hart: usize) -> u64 {
        self.base + MTIMECMP_OFFSET + 8 * hart as u64
    }

    /// Raises a machine software interrupt on `hart`.
    pub fn trigger_software(&self, hart: usize) {
        self.mmio.write_u32(self.msip(hart), 1);
    }

    /// Retracts `hart`'s machine software interrupt.
    pub fn clear_software(&self, hart: usize) {
        self.mmio.write_u32(self.msip(hart), 0);
    }

    /// Returns `true` if `hart`'s MSIP bit is set.
    pub fn software_pending(&self, hart: usize) -> bool {
        self.mmio.read_u32(self.msip(hart)) & 1 != 0
    }

    /// Reads the machine timer.
    pub fn mtime(&self) -> u64 {
        self.mmio.read_u64(self.base + MTIME_OFFSET)
    }

    /// Programs `hart`'s timer compare value.
    pub fn set_timecmp(&self, hart: usize, value: u64) {
        self.mmio.write_u64(self.mtimecmp(hart), value);
    }

    /// Reads `hart`'s timer compare value.
    pub fn timecmp(&self, hart: usize) -> u64 {
        self.mmio.read_u64(self.mtimecmp(hart))
    }
}
