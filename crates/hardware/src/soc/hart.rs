//! Simulated hart.
//!
//! Holds the machine-mode trap CSRs of one hart and delivers interrupts at the
//! only point a host thread can be interrupted safely: inside [`Hart::relax`].
//! Each relax step:
//! 1. **Ticks** the platform so devices advance and device outputs reach the APLIC.
//! 2. **Samples** the hart's interrupt lines into `mip`.
//! 3. **Traps** on the highest-priority pending and enabled interrupt (MEI, then MSI, then MTI)
//!    when `mstatus.MIE` is set, emulating trap entry and `mret` around the installed vector.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use tracing::trace;

use crate::arch::cause;
use crate::arch::csr;
use crate::common::FatalTrap;
use crate::hal::{Hart, TrapEntry};
use crate::soc::System;

/// Machine trap CSRs that are plain storage on a simulated hart.
#[derive(Clone, Copy, Debug, Default)]
struct Csrs {
    mstatus: u64,
    mie: u64,
    mtvec: u64,
    mscratch: u64,
    mepc: u64,
    mcause: u64,
    mtval: u64,
}

/// Interrupts in the order the hart takes them when several are pending.
const TRAP_PRIORITY: [(u64, u64); 3] = [
    (csr::MIP_MEIP, cause::interrupt::MACHINE_EXTERNAL),
    (csr::MIP_MSIP, cause::interrupt::MACHINE_SOFTWARE),
    (csr::MIP_MTIP, cause::interrupt::MACHINE_TIMER),
];

/// One simulated hart attached to a [`System`].
pub struct SimHart {
    id: usize,
    system: Arc<System>,
    csrs: Mutex<Csrs>,
    vector: OnceLock<Arc<dyn TrapEntry>>,
    steps: AtomicU64,
}

impl std::fmt::Debug for SimHart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimHart")
            .field("id", &self.id)
            .field("csrs", &*self.csrs())
            .field("vector_installed", &self.vector.get().is_some())
            .field("steps", &self.steps())
            .finish_non_exhaustive()
    }
}

impl SimHart {
    /// Creates hart `id` with every interrupt disabled and no trap vector.
    pub fn new(id: usize, system: Arc<System>) -> Self {
        Self {
            id,
            system,
            csrs: Mutex::new(Csrs::default()),
            vector: OnceLock::new(),
            steps: AtomicU64::new(0),
        }
    }

    /// Installs the trap vector. Returns `false` if one was already installed.
    pub fn install_vector(&self, vector: Arc<dyn TrapEntry>) -> bool {
        self.vector.set(vector).is_ok()
    }

    /// Relax steps taken so far.
    pub fn steps(&self) -> u64 {
        self.steps.load(Ordering::Relaxed)
    }

    fn csrs(&self) -> MutexGuard<'_, Csrs> {
        self.csrs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn mip(&self) -> u64 {
        let lines = self.system.lines(self.id);
        let mut mip = 0;
        if lines.msip {
            mip |= csr::MIP_MSIP;
        }
        if lines.mtip {
            mip |= csr::MIP_MTIP;
        }
        if lines.meip {
            mip |= csr::MIP_MEIP;
        }
        mip
    }

    /// Raises a synchronous exception with `code` and `tval` on this hart.
    pub fn raise_exception(&self, code: u64, tval: u64) -> Result<(), FatalTrap> {
        self.take_trap(code & cause::CODE_MASK, tval, self.steps())
    }

    /// Trap entry, vector call, and `mret`. `epc` is the relax step the trap interrupted.
    fn take_trap(&self, mcause: u64, mtval: u64, epc: u64) -> Result<(), FatalTrap> {
        let vector = self
            .vector
            .get()
            .cloned()
            .ok_or(FatalTrap::NoTrapVector(self.id))?;

        {
            let mut csrs = self.csrs();
            if csrs.mstatus & csr::MSTATUS_MIE != 0 {
                csrs.mstatus |= csr::MSTATUS_MPIE;
            } else {
                csrs.mstatus &= !csr::MSTATUS_MPIE;
            }
            csrs.mstatus &= !csr::MSTATUS_MIE;
            csrs.mcause = mcause;
            csrs.mepc = epc;
            csrs.mtval = mtval;
        }
        trace!(hart = self.id, mcause = format_args!("{mcause:#x}"), "trap");

        let result = vector.on_trap(self);

        let mut csrs = self.csrs();
        if csrs.mstatus & csr::MSTATUS_MPIE != 0 {
            csrs.mstatus |= csr::MSTATUS_MIE;
        }
        csrs.mstatus |= csr::MSTATUS_MPIE;
        result
    }
}

impl Hart for SimHart {
    fn hart_id(&self) -> usize {
        self.id
    }

    fn read_csr(&self, csr: u32) -> u64 {
        if csr == csr::MHARTID {
            return self.id as u64;
        }
        if csr == csr::MIP {
            return self.mip();
        }
        let csrs = self.csrs();
        match csr {
            csr::MSTATUS => csrs.mstatus,
            csr::MIE => csrs.mie,
            csr::MTVEC => csrs.mtvec,
            csr::MSCRATCH => csrs.mscratch,
            csr::MEPC => csrs.mepc,
            csr::MCAUSE => csrs.mcause,
            csr::MTVAL => csrs.mtval,
            _ => 0,
        }
    }

    fn write_csr(&self, csr: u32, val: u64) {
        let mut csrs = self.csrs();
        match csr {
            csr::MSTATUS => csrs.mstatus = val,
            csr::MIE => csrs.mie = val,
            csr::MTVEC => csrs.mtvec = val,
            csr::MSCRATCH => csrs.mscratch = val,
            csr::MEPC => csrs.mepc = val,
            csr::MCAUSE => csrs.mcause = val,
            csr::MTVAL => csrs.mtval = val,
            // mip bits are driven by the platform; mhartid is read-only.
            _ => {}
        }
    }

    fn relax(&self) -> Result<(), FatalTrap> {
        std::hint::spin_loop();
        self.system.tick();
        let step = self.steps.fetch_add(1, Ordering::Relaxed) + 1;

        let (mstatus, mie) = {
            let csrs = self.csrs();
            (csrs.mstatus, csrs.mie)
        };
        if mstatus & csr::MSTATUS_MIE == 0 {
            return Ok(());
        }
        let ready = self.mip() & mie;
        match TRAP_PRIORITY.iter().find(|(bit, _)| ready & bit != 0) {
            Some(&(_, mcause)) => self.take_trap(mcause, 0, step),
            None => Ok(()),
        }
    }
}
