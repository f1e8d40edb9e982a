//! Architectural definitions for machine-mode interrupt handling.
//!
//! This module collects the privileged-architecture constants the harness touches:
//! 1. **CSRs:** Addresses and bit fields of the machine trap-handling registers.
//! 2. **Trap Causes:** `mcause` encodings for the three major interrupts and exceptions.

/// Trap cause codes and `mcause` decoding.
pub mod cause;

/// Machine-mode CSR addresses and bit fields.
pub mod csr;

pub use cause::TrapCause;
