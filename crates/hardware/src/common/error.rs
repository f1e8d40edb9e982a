//! Error types for the interrupt harness.
//!
//! This module defines the error taxonomy used throughout the crate. It provides:
//! 1. **Controller Errors:** Argument validation and read-back failures raised by the APLIC driver.
//! 2. **Dispatch Errors:** Conditions detected while draining claims inside the trap vector.
//! 3. **Fatal Traps:** Platform misbehavior (exceptions, unknown interrupts) that ends the run.
//! 4. **Scenario Errors:** Per-scenario verdicts, each mapped to a process exit code.

use thiserror::Error;

use crate::sequencer::Scenario;

/// Errors reported by the APLIC driver.
///
/// Validation errors are raised before any register is written, so a rejected call
/// leaves the controller untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AplicError {
    /// The requested source mode is not one of the supported trigger modes.
    #[error("trigger mode {0} is not a valid source mode")]
    InvalidTriggerMode(u32),

    /// The interrupt id is 0 or larger than the number of implemented sources.
    #[error("interrupt id {id} does not exist (sources 1..={max})")]
    InvalidSourceId {
        /// Rejected identifier.
        id: u32,
        /// Highest implemented source id.
        max: u32,
    },

    /// The hart index has no interrupt delivery control block.
    #[error("hart {hart} has no interrupt delivery control (harts 0..{count})")]
    InvalidHart {
        /// Rejected hart index.
        hart: usize,
        /// Number of harts with a delivery control block.
        count: usize,
    },

    /// Enable was written through `setienum` but the source's bit in `setie` stayed clear.
    #[error("interrupt {0} not enabled in setie after setienum")]
    EnableVerificationFailed(u32),

    /// A force was requested while a real interrupt is already waiting to be claimed.
    #[error("topi reads {topi:#x}; refusing to force an interrupt on hart {hart}")]
    ForceWhileClaimOutstanding {
        /// Hart whose delivery control was targeted.
        hart: usize,
        /// Raw `topi` value observed.
        topi: u32,
    },
}

/// Errors raised by the claim/dispatch engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The same claim kept re-appearing at the top of the queue within one trap.
    ///
    /// A handler that does not quiet its device (or a controller that does not clear
    /// pending on claim) would otherwise keep the hart in the drain loop forever.
    #[error("interrupt {id} re-asserted {repeats} times in one trap; claim/clear race suspected")]
    RepeatedClaimSuspected {
        /// Source that kept re-appearing.
        id: u32,
        /// Consecutive repeats observed before giving up.
        repeats: u32,
    },

    /// A controller access inside the drain loop was rejected.
    #[error(transparent)]
    Controller(#[from] AplicError),
}

/// Traps the harness cannot recover from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FatalTrap {
    /// A synchronous exception reached the trap vector.
    #[error("exception: mcause {mcause:#x}, mepc {mepc:#x}, mtval {mtval:#x}")]
    Exception {
        /// Machine cause register.
        mcause: u64,
        /// Machine exception program counter.
        mepc: u64,
        /// Machine trap value.
        mtval: u64,
    },

    /// An interrupt with no handler in the trap vector fired.
    #[error("unexpected interrupt: mcause {0:#x}")]
    UnexpectedInterrupt(u64),

    /// A trap was taken on a hart with no trap vector installed.
    #[error("trap taken on hart {0} with no trap vector installed")]
    NoTrapVector(usize),

    /// A trap was taken on a hart with no counter block.
    #[error("trap taken on unknown hart {0}")]
    UnknownHart(usize),
}

/// Scenario failures, each carrying the process exit code used to report it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarnessError {
    /// The expected interrupt never reached its handler within the wait budget.
    #[error("{scenario}: interrupt not delivered within the wait budget")]
    DeliveryTimeout {
        /// Scenario that timed out.
        scenario: Scenario,
    },

    /// The handler ran more than once for a single assertion.
    #[error("{scenario}: handler ran {count} times for one assertion")]
    SpuriousRedelivery {
        /// Scenario that observed the redelivery.
        scenario: Scenario,
        /// Final handler invocation count.
        count: u32,
    },

    /// A forced interrupt was refused because a real one was outstanding.
    #[error("forced interrupt not triggered: topi reads {topi:#x}")]
    ForceRejected {
        /// Raw `topi` value observed before forcing.
        topi: u32,
    },

    /// Sources pending together were not dispatched in priority order.
    #[error("drain order {observed:?}, expected {expected:?}")]
    DrainOrderMismatch {
        /// Expected dispatch order.
        expected: Vec<u32>,
        /// Observed dispatch order.
        observed: Vec<u32>,
    },

    /// A source was still pending after its handler cleared it.
    #[error("interrupt {0} still pending after its handler ran")]
    PendingNotCleared(u32),

    /// Controller configuration was rejected.
    #[error("controller configuration failed: {0}")]
    Configuration(#[from] AplicError),

    /// The platform took a trap the harness cannot handle.
    #[error("fatal trap: {0}")]
    Fatal(#[from] FatalTrap),
}

impl HarnessError {
    /// Process exit code reported for this failure.
    ///
    /// Timeouts and spurious redeliveries keep the codes the harness has always used
    /// per interrupt class, so external scripts can tell the classes apart.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::DeliveryTimeout { scenario } => match scenario {
                Scenario::Software => 0x75,
                Scenario::Timer => 0x77,
                _ => 0xEE,
            },
            Self::SpuriousRedelivery { scenario, .. } => match scenario {
                Scenario::Software => 0xFA,
                Scenario::Timer => 0xFB,
                _ => 0xFC,
            },
            Self::ForceRejected { .. } => 0xA1,
            Self::Configuration(AplicError::EnableVerificationFailed(_)) => 0x05,
            Self::Configuration(_) => 0x08,
            Self::DrainOrderMismatch { .. } => 0xD0,
            Self::PendingNotCleared(_) => 0xD1,
            Self::Fatal(_) => 0xEF,
        }
    }
}
