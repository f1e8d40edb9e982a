//! System-on-Chip (SoC) Components.
//!
//! This module organizes the simulated platform the harness runs against on a
//! host: the system bus, the interrupt-related devices, simulated harts, and
//! the builder that assembles them from configuration.

/// System builder for assembling SoC components.
pub mod builder;

/// Memory-mapped I/O device implementations.
pub mod devices;

/// Simulated harts (CSR file and trap delivery).
pub mod hart;

/// System bus interconnect and routing.
pub mod interconnect;

/// Device trait definitions for MMIO access.
pub mod traits;

pub use builder::System;
pub use hart::SimHart;
pub use interconnect::{Bus, IrqLines};
