//! Hart and trap-entry interfaces.

use crate::common::FatalTrap;

/// One hardware thread as seen by the harness.
///
/// Implementations must make `relax` the only point where interrupts are delivered
/// on simulated harts; on hardware, traps arrive asynchronously and `relax` only
/// reports a fatal trap recorded by the vector.
pub trait Hart: Send + Sync {
    /// Hart identifier (`mhartid`).
    fn hart_id(&self) -> usize;

    /// Reads a CSR.
    fn read_csr(&self, csr: u32) -> u64;

    /// Writes a CSR.
    fn write_csr(&self, csr: u32, val: u64);

    /// Sets `mask` bits in a CSR.
    fn set_csr_bits(&self, csr: u32, mask: u64) {
        let old = self.read_csr(csr);
        self.write_csr(csr, old | mask);
    }

    /// Clears `mask` bits in a CSR.
    fn clear_csr_bits(&self, csr: u32, mask: u64) {
        let old = self.read_csr(csr);
        self.write_csr(csr, old & !mask);
    }

    /// One iteration of a busy-wait loop.
    ///
    /// # Returns
    ///
    /// An error if a trap taken during this iteration could not be handled.
    fn relax(&self) -> Result<(), FatalTrap>;
}

/// Trap vector entry point, invoked with global interrupts disabled.
pub trait TrapEntry: Send + Sync {
    /// Handles the trap described by the hart's `mcause`, `mepc`, and `mtval`.
    fn on_trap(&self, hart: &dyn Hart) -> Result<(), FatalTrap>;
}
