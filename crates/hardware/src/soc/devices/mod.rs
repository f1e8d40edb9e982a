//! Memory-Mapped IO Devices.
//!
//! This module contains models of the interrupt-related devices found in the
//! SoC: the APLIC, the core-local interruptor (CLINT), and bus-error units.

/// Advanced Platform-Level Interrupt Controller (direct delivery mode).
pub mod aplic;

/// Bus-error unit.
pub mod beu;

/// Core Local Interruptor (timer and software interrupt controller).
pub mod clint;

pub use aplic::AplicDevice;
pub use beu::BusErrorUnitDevice;
pub use clint::ClintDevice;

pub use crate::soc::traits::Device;
