//! Machine-mode trap vector.
//!
//! Decodes `mcause` and runs one of three major-interrupt handlers:
//! 1. **Software:** Counts the trap and clears the hart's MSIP.
//! 2. **Timer:** Counts the trap and pushes MTIMECMP far into the future.
//! 3. **External:** Drains the APLIC through the claim engine and counts the trap once.
//!
//! Any other interrupt, and every exception, is fatal.

use tracing::{error, warn};

use crate::arch::{TrapCause, csr};
use crate::common::{DispatchError, FatalTrap};
use crate::dispatch::{ClaimEngine, Counter, CounterBank, HartCounters};
use crate::drivers::Clint;
use crate::hal::{Hart, RegisterAccess, TrapEntry};

/// Distance MTIMECMP is pushed past MTIME after a timer interrupt.
pub const TIMER_PARK_DELTA: u64 = 0x00A0_0000;

/// Trap vector shared by every hart.
#[derive(Debug)]
pub struct TrapVector<R> {
    engine: ClaimEngine<R>,
    clint: Clint<R>,
    counters: CounterBank,
}

impl<R: RegisterAccess> TrapVector<R> {
    /// Creates the vector.
    pub const fn new(engine: ClaimEngine<R>, clint: Clint<R>, counters: CounterBank) -> Self {
        Self {
            engine,
            clint,
            counters,
        }
    }

    /// Counters updated by this vector.
    pub const fn counters(&self) -> &CounterBank {
        &self.counters
    }

    fn software(&self, hart: usize, counters: &HartCounters) {
        counters.increment(Counter::Software);
        self.clint.clear_software(hart);
    }

    fn timer(&self, hart: usize, counters: &HartCounters) {
        counters.increment(Counter::Timer);
        let now = self.clint.mtime();
        self.clint.set_timecmp(hart, now.wrapping_add(TIMER_PARK_DELTA));
    }

    fn external(&self, hart: usize, counters: &HartCounters) {
        match self.engine.drain(hart) {
            Ok(report) => {
                counters.add(Counter::SpuriousClaim, report.spurious);
                counters.add(Counter::RepeatedClaim, report.repeats);
            }
            Err(err @ DispatchError::RepeatedClaimSuspected { repeats, .. }) => {
                counters.add(Counter::RepeatedClaim, repeats);
                error!(hart, %err, "drain abandoned");
            }
            Err(err) => error!(hart, %err, "drain failed"),
        }
        counters.increment(Counter::External);
    }
}

impl<R: RegisterAccess> TrapEntry for TrapVector<R> {
    fn on_trap(&self, hart: &dyn Hart) -> Result<(), FatalTrap> {
        let id = hart.hart_id();
        let mcause = hart.read_csr(csr::MCAUSE);
        let counters = self.counters.hart(id).ok_or(FatalTrap::UnknownHart(id))?;

        match TrapCause::from_mcause(mcause) {
            TrapCause::MachineSoftware => self.software(id, counters),
            TrapCause::MachineTimer => self.timer(id, counters),
            TrapCause::MachineExternal => self.external(id, counters),
            TrapCause::OtherInterrupt(cause) => {
                warn!(hart = id, mcause = format_args!("{cause:#x}"), "unexpected interrupt");
                return Err(FatalTrap::UnexpectedInterrupt(cause));
            }
            TrapCause::Exception(_) => {
                let fatal = FatalTrap::Exception {
                    mcause,
                    mepc: hart.read_csr(csr::MEPC),
                    mtval: hart.read_csr(csr::MTVAL),
                };
                error!(hart = id, %fatal, "exception in harness");
                return Err(fatal);
            }
        }
        Ok(())
    }
}
