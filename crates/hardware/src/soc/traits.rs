//! Device trait for memory-mapped I/O.
//!
//! This module defines the `Device` trait implemented by all bus-attached components. It provides:
//! 1. **Identification:** `name` and `address_range` for bus routing.
//! 2. **Access:** Byte, half, word, and doubleword read/write at device-relative offsets.
//! 3. **Lifecycle:** Optional `tick` and IRQ reporting for interrupt-raising devices.
//! 4. **Downcasting:** Optional casts to the APLIC and CLINT models for interrupt wiring.

use crate::soc::devices::{AplicDevice, ClintDevice};

/// Trait for memory-mapped I/O devices attached to the system bus.
///
/// Reads take `&mut self` because register reads may have side effects
/// (claiming an interrupt, for one).
pub trait Device: Send + Sync {
    /// Returns a short name for this device (e.g., `"APLIC"`, `"BEU1"`).
    fn name(&self) -> &str;
    /// Returns (base_address, size_in_bytes) for this device's MMIO region.
    fn address_range(&self) -> (u64, u64);
    /// Reads one byte at the given device-relative offset.
    fn read_u8(&mut self, offset: u64) -> u8;
    /// Reads two bytes (little-endian) at the given offset.
    fn read_u16(&mut self, offset: u64) -> u16;
    /// Reads four bytes (little-endian) at the given offset.
    fn read_u32(&mut self, offset: u64) -> u32;
    /// Reads eight bytes (little-endian) at the given offset.
    fn read_u64(&mut self, offset: u64) -> u64;
    /// Writes one byte at the given offset.
    fn write_u8(&mut self, offset: u64, val: u8);
    /// Writes two bytes (little-endian) at the given offset.
    fn write_u16(&mut self, offset: u64, val: u16);
    /// Writes four bytes (little-endian) at the given offset.
    fn write_u32(&mut self, offset: u64, val: u32);
    /// Writes eight bytes (little-endian) at the given offset.
    fn write_u64(&mut self, offset: u64, val: u64);

    /// Advances device state by one tick; returns `true` while the device's interrupt output is high.
    fn tick(&mut self) -> bool {
        false
    }
    /// Returns the APLIC source this device's interrupt output is wired to, if any.
    fn get_irq_id(&self) -> Option<u32> {
        None
    }

    /// Returns a mutable reference as `AplicDevice` if this device is the APLIC; otherwise `None`.
    fn as_aplic_mut(&mut self) -> Option<&mut AplicDevice> {
        None
    }
    /// Returns a mutable reference as `ClintDevice` if this device is the CLINT; otherwise `None`.
    fn as_clint_mut(&mut self) -> Option<&mut ClintDevice> {
        None
    }
}
