//! Hardware abstraction layer.
//!
//! Drivers never touch memory or CSRs directly; they go through the two seams defined
//! here. This module provides:
//! 1. **Register Access:** `RegisterAccess`, implemented by the simulated bus.
//! 2. **Hart Interface:** `Hart` for CSR access and interrupt relaxation, `TrapEntry` for the vector.

/// Hart and trap-entry interfaces.
pub mod hart;

/// Register access trait and forwarding implementations.
pub mod mmio;

pub use hart::{Hart, TrapEntry};
pub use mmio::RegisterAccess;
