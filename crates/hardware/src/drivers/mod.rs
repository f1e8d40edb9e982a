//! Memory-mapped device drivers.
//!
//! Each driver is a thin, cloneable view over a [`RegisterAccess`](crate::hal::RegisterAccess)
//! backend and a base address. It provides:
//! 1. **APLIC:** Source configuration, pending/enable control, per-hart delivery, claims.
//! 2. **CLINT:** Software interrupt triggering and machine timer programming.
//! 3. **Bus-Error Units:** Error-class arming, simulated errors, and the interrupt bridge.

/// APLIC direct-mode driver.
pub mod aplic;

/// Bus-error unit driver and interrupt bridge.
pub mod beu;

/// Core-local interruptor driver.
pub mod clint;

pub use aplic::{Aplic, ClaimView, Privilege, TriggerMode};
pub use beu::{BusErrorBridge, BusErrorUnit, ErrorClass};
pub use clint::Clint;
