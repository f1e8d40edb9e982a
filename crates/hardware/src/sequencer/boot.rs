//! Boot barrier and secondary hart parking.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use crate::arch::csr;
use crate::common::FatalTrap;
use crate::hal::Hart;

/// Holds secondary harts until the boot hart has finished global configuration.
#[derive(Debug, Default)]
pub struct BootBarrier {
    released: AtomicBool,
}

impl BootBarrier {
    /// Creates a closed barrier.
    pub const fn new() -> Self {
        Self {
            released: AtomicBool::new(false),
        }
    }

    /// Opens the barrier.
    pub fn release(&self) {
        self.released.store(true, Ordering::Release);
    }

    /// Returns `true` once the barrier has been opened.
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Relaxes `hart` until the barrier opens or `abort` is raised.
    ///
    /// # Returns
    ///
    /// `true` if the barrier opened, `false` if the wait was aborted.
    pub fn wait(&self, hart: &dyn Hart, abort: &AtomicBool) -> Result<bool, FatalTrap> {
        while !self.is_released() {
            if abort.load(Ordering::Acquire) {
                return Ok(false);
            }
            hart.relax()?;
        }
        Ok(true)
    }
}

/// Parks a secondary hart: waits at the barrier, enables external interrupts,
/// then relaxes until `shutdown` is raised.
pub fn park_secondary(
    hart: &dyn Hart,
    barrier: &BootBarrier,
    shutdown: &AtomicBool,
) -> Result<(), FatalTrap> {
    let id = hart.hart_id();
    if !barrier.wait(hart, shutdown)? {
        warn!(hart = id, "released by shutdown before the boot barrier opened");
        return Ok(());
    }

    hart.set_csr_bits(csr::MIE, csr::MIE_MEIP);
    hart.set_csr_bits(csr::MSTATUS, csr::MSTATUS_MIE);
    debug!(hart = id, "secondary hart parked");

    while !shutdown.load(Ordering::Acquire) {
        hart.relax()?;
    }
    Ok(())
}
