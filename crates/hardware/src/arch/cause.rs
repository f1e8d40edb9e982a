//! RISC-V Trap Cause Codes.
//!
//! This module defines the cause codes found in `mcause`. The most significant bit
//! indicates whether the trap is an interrupt (1) or an exception (0).
//!
//! The constants here represent the exception code (lower bits) combined with
//! the interrupt bit where applicable.

/// Interrupt bit of `mcause` on RV64.
pub const INTERRUPT_BIT: u64 = 1 << 63;

/// Mask selecting the cause code below the interrupt bit.
pub const CODE_MASK: u64 = !INTERRUPT_BIT;

/// Interrupt definitions (MSB = 1).
pub mod interrupt {
    /// Supervisor software interrupt.
    pub const SUPERVISOR_SOFTWARE: u64 = 0x8000_0000_0000_0001;

    /// Machine software interrupt.
    pub const MACHINE_SOFTWARE: u64 = 0x8000_0000_0000_0003;

    /// Supervisor timer interrupt.
    pub const SUPERVISOR_TIMER: u64 = 0x8000_0000_0000_0005;

    /// Machine timer interrupt.
    pub const MACHINE_TIMER: u64 = 0x8000_0000_0000_0007;

    /// Supervisor external interrupt.
    pub const SUPERVISOR_EXTERNAL: u64 = 0x8000_0000_0000_0009;

    /// Machine external interrupt.
    pub const MACHINE_EXTERNAL: u64 = 0x8000_0000_0000_000B;
}

/// Exception definitions (MSB = 0).
pub mod exception {
    /// Instruction access fault (1).
    pub const INSTRUCTION_ACCESS_FAULT: u64 = 1;
    /// Illegal instruction (2).
    pub const ILLEGAL_INSTRUCTION: u64 = 2;
    /// Breakpoint (3).
    pub const BREAKPOINT: u64 = 3;
    /// Load access fault (5).
    pub const LOAD_ACCESS_FAULT: u64 = 5;
    /// Store/AMO access fault (7).
    pub const STORE_ACCESS_FAULT: u64 = 7;
    /// Environment call from M-mode (11).
    pub const ENVIRONMENT_CALL_FROM_M_MODE: u64 = 11;
    /// Hardware error (18), raised by some cores for uncorrectable bus errors.
    pub const HARDWARE_ERROR: u64 = 18;
}

/// Classification of an `mcause` value as seen by the trap vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrapCause {
    /// Machine software interrupt (CLINT `msip`).
    MachineSoftware,
    /// Machine timer interrupt (CLINT `mtimecmp`).
    MachineTimer,
    /// Machine external interrupt (APLIC delivery).
    MachineExternal,
    /// Any other interrupt; the raw `mcause` is kept.
    OtherInterrupt(u64),
    /// A synchronous exception; the exception code is kept.
    Exception(u64),
}

impl TrapCause {
    /// Decodes a raw `mcause` value.
    pub const fn from_mcause(mcause: u64) -> Self {
        match mcause {
            interrupt::MACHINE_SOFTWARE => Self::MachineSoftware,
            interrupt::MACHINE_TIMER => Self::MachineTimer,
            interrupt::MACHINE_EXTERNAL => Self::MachineExternal,
            _ if mcause & INTERRUPT_BIT != 0 => Self::OtherInterrupt(mcause),
            _ => Self::Exception(mcause & CODE_MASK),
        }
    }

    /// Returns `true` for asynchronous causes.
    pub const fn is_interrupt(self) -> bool {
        !matches!(self, Self::Exception(_))
    }
}
