//! System interconnect (bus) for MMIO access.
//!
//! This module implements the bus that routes physical address accesses to devices. It provides:
//! 1. **Device registration:** Devices are added by address range and sorted for lookup.
//! 2. **Access routing:** Read/write by address with last-device hint for throughput.
//! 3. **Tick and IRQ:** Each device is ticked; asserted outputs are fed to the APLIC as wire levels.
//! 4. **Hart lines:** Per-hart MSIP, MTIP, and MEIP derived from the CLINT and APLIC.

use tracing::trace;

use super::devices::{AplicDevice, ClintDevice, Device};

/// Interrupt lines into one hart's `mip`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IrqLines {
    /// Machine software interrupt (CLINT MSIP).
    pub msip: bool,
    /// Machine timer interrupt (CLINT MTIME >= MTIMECMP).
    pub mtip: bool,
    /// Machine external interrupt (APLIC IDC output).
    pub meip: bool,
}

/// System bus connecting harts and devices; routes accesses by physical address.
pub struct Bus {
    /// Registered MMIO devices, sorted by base address.
    devices: Vec<Box<dyn Device>>,
    last_device_idx: usize,
    aplic_idx: Option<usize>,
    clint_idx: Option<usize>,
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.devices.iter().map(|d| {
                let (base, size) = d.address_range();
                (d.name().to_owned(), base, size)
            }))
            .finish()
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus {
    /// Creates an empty bus; add devices with `add_device`.
    pub const fn new() -> Self {
        Self {
            devices: Vec::new(),
            last_device_idx: 0,
            aplic_idx: None,
            clint_idx: None,
        }
    }

    /// Registers a device on the bus; devices are sorted by base address for lookup.
    pub fn add_device(&mut self, dev: Box<dyn Device>) {
        self.devices.push(dev);
        self.devices.sort_by_key(|d| d.address_range().0);
        self.aplic_idx = self.devices.iter_mut().position(|d| d.as_aplic_mut().is_some());
        self.clint_idx = self.devices.iter_mut().position(|d| d.as_clint_mut().is_some());
        self.last_device_idx = 0;
    }

    /// Names of the registered devices, in address order.
    pub fn device_names(&self) -> Vec<&str> {
        self.devices.iter().map(|d| d.name()).collect()
    }

    /// Returns the APLIC model, if one is registered.
    pub fn aplic_mut(&mut self) -> Option<&mut AplicDevice> {
        let idx = self.aplic_idx?;
        self.devices.get_mut(idx)?.as_aplic_mut()
    }

    /// Returns the CLINT model, if one is registered.
    pub fn clint_mut(&mut self) -> Option<&mut ClintDevice> {
        let idx = self.clint_idx?;
        self.devices.get_mut(idx)?.as_clint_mut()
    }

    /// Returns the device named `name`.
    pub fn device_mut(&mut self, name: &str) -> Option<&mut Box<dyn Device>> {
        self.devices.iter_mut().find(|d| d.name() == name)
    }

    /// Advances all devices by one tick and feeds asserted outputs into the APLIC.
    pub fn tick(&mut self) {
        let mut asserted = Vec::new();
        for dev in &mut self.devices {
            if dev.tick() {
                if let Some(id) = dev.get_irq_id() {
                    asserted.push(id);
                }
            }
        }
        if !asserted.is_empty() {
            trace!(?asserted, "device outputs high");
        }
        if let Some(aplic) = self.aplic_mut() {
            aplic.update_inputs(&asserted);
        }
    }

    /// Current interrupt lines into `hart`.
    pub fn lines(&mut self, hart: usize) -> IrqLines {
        let (msip, mtip) = self
            .clint_mut()
            .map_or((false, false), |c| (c.software_pending(hart), c.timer_pending(hart)));
        let meip = self.aplic_mut().is_some_and(|a| a.meip(hart));
        IrqLines { msip, mtip, meip }
    }

    fn find_device(&mut self, paddr: u64) -> Option<(&mut Box<dyn Device>, u64)> {
        if self.last_device_idx < self.devices.len() {
            let (start, size) = self.devices[self.last_device_idx].address_range();
            if paddr >= start && paddr < start + size {
                return Some((&mut self.devices[self.last_device_idx], paddr - start));
            }
        }

        for (i, dev) in self.devices.iter_mut().enumerate() {
            let (start, size) = dev.address_range();
            if paddr >= start && paddr < start + size {
                self.last_device_idx = i;
                return Some((dev, paddr - start));
            }
        }
        None
    }

    /// Reads one byte at the given physical address; returns 0 if no device claims the address.
    pub fn read_u8(&mut self, paddr: u64) -> u8 {
        self.find_device(paddr).map_or(0, |(dev, offset)| dev.read_u8(offset))
    }
    /// Reads two bytes (little-endian) at the given physical address; returns 0 if unclaimed.
    pub fn read_u16(&mut self, paddr: u64) -> u16 {
        self.find_device(paddr).map_or(0, |(dev, offset)| dev.read_u16(offset))
    }
    /// Reads four bytes (little-endian) at the given physical address; returns 0 if unclaimed.
    pub fn read_u32(&mut self, paddr: u64) -> u32 {
        self.find_device(paddr).map_or(0, |(dev, offset)| dev.read_u32(offset))
    }
    /// Reads eight bytes (little-endian) at the given physical address; returns 0 if unclaimed.
    pub fn read_u64(&mut self, paddr: u64) -> u64 {
        self.find_device(paddr).map_or(0, |(dev, offset)| dev.read_u64(offset))
    }
    /// Writes one byte at the given physical address; no-op if no device claims it.
    pub fn write_u8(&mut self, paddr: u64, val: u8) {
        if let Some((dev, offset)) = self.find_device(paddr) {
            dev.write_u8(offset, val);
        }
    }
    /// Writes two bytes (little-endian) at the given physical address; no-op if unclaimed.
    pub fn write_u16(&mut self, paddr: u64, val: u16) {
        if let Some((dev, offset)) = self.find_device(paddr) {
            dev.write_u16(offset, val);
        }
    }
    /// Writes four bytes (little-endian) at the given physical address; no-op if unclaimed.
    pub fn write_u32(&mut self, paddr: u64, val: u32) {
        if let Some((dev, offset)) = self.find_device(paddr) {
            dev.write_u32(offset, val);
        }
    }
    /// Writes eight bytes (little-endian) at the given physical address; no-op if unclaimed.
    pub fn write_u64(&mut self, paddr: u64, val: u64) {
        if let Some((dev, offset)) = self.find_device(paddr) {
            dev.write_u64(offset, val);
        }
    }
}
